mod layout;
pub use layout::AppLayout;

mod login;
pub use login::Login;

mod families;
pub use families::Families;

mod family_detail;
pub use family_detail::FamilyDetail;

mod add_members;
pub use add_members::AddMembers;
