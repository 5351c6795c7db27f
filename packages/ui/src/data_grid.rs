//! Sortable, filterable, paginated table over rows already held by a view.

use dioxus::prelude::*;
use registry::grid::{GridConfig, GridState, SortDirection, SortModel};
use registry::views::{Column, RowAction};

use crate::icons::{FaArrowDown, FaArrowUp, FaChevronLeft, FaChevronRight};
use crate::Icon;

#[component]
pub fn DataGrid<R: Clone + PartialEq + 'static>(
    columns: Vec<Column<R>>,
    rows: Vec<R>,
    config: GridConfig,
    #[props(default)] loading: bool,
    /// Buttons rendered at the end of each row.
    #[props(default)]
    actions: Vec<RowAction>,
    on_action: Option<EventHandler<(RowAction, R)>>,
) -> Element {
    let mut grid = use_signal(|| GridState::new(config.clone()));

    // Clamping happens on a copy so rendering never writes the signal.
    let mut snapshot = grid.read().clone();
    let page = snapshot.view(&columns, &rows);
    let (current, page_count, total) = (page.page, page.page_count, page.total);
    let visible: Vec<R> = page.rows.into_iter().cloned().collect();
    let sort = snapshot.sort();
    let page_size = snapshot.page_size();
    let span = columns.len() + usize::from(!actions.is_empty());
    let first = if total == 0 { 0 } else { current * page_size + 1 };
    let last = (current * page_size + visible.len()).min(total);

    rsx! {
        div {
            class: "data-grid",

            div {
                class: "grid-toolbar",
                input {
                    class: "grid-filter",
                    r#type: "search",
                    placeholder: "Search...",
                    value: snapshot.quick_filter().to_string(),
                    oninput: move |e| grid.write().set_quick_filter(e.value()),
                }
            }

            table {
                thead {
                    tr {
                        for column in columns.iter().copied() {
                            th {
                                key: "{column.field}",
                                class: "sortable",
                                onclick: move |_| grid.write().toggle_sort(column.field),
                                "{column.header}"
                                {sort_marker(sort, column.field)}
                            }
                        }
                        if !actions.is_empty() {
                            th { "Actions" }
                        }
                    }
                }
                tbody {
                    if visible.is_empty() {
                        tr {
                            td {
                                colspan: "{span}",
                                class: "grid-empty",
                                if loading { "Loading..." } else { "No rows" }
                            }
                        }
                    }
                    for row in visible {
                        tr {
                            for column in columns.iter() {
                                td { {(column.value)(&row).display()} }
                            }
                            if !actions.is_empty() {
                                td {
                                    class: "grid-actions",
                                    for action in actions.iter().copied() {
                                        button {
                                            onclick: {
                                                let row = row.clone();
                                                move |_| {
                                                    if let Some(handler) = on_action {
                                                        handler.call((action, row.clone()));
                                                    }
                                                }
                                            },
                                            {action.label()}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div {
                class: "grid-footer",
                span { "Rows per page:" }
                select {
                    onchange: move |e| {
                        if let Ok(size) = e.value().parse::<usize>() {
                            grid.write().set_page_size(size);
                        }
                    },
                    for size in config.page_size_options.iter().copied() {
                        option {
                            value: "{size}",
                            selected: size == page_size,
                            "{size}"
                        }
                    }
                }
                span { "{first}-{last} of {total}" }
                button {
                    disabled: current == 0,
                    onclick: move |_| grid.write().set_page(current.saturating_sub(1)),
                    Icon { icon: FaChevronLeft, width: 12, height: 12 }
                }
                button {
                    disabled: current + 1 >= page_count,
                    onclick: move |_| grid.write().set_page(current + 1),
                    Icon { icon: FaChevronRight, width: 12, height: 12 }
                }
            }
        }

        style {
            r#"
            .data-grid table {{
                width: 100%;
                border-collapse: collapse;
            }}
            .data-grid th, .data-grid td {{
                padding: 0.5rem 0.75rem;
                border-bottom: 1px solid #e0e0e0;
                text-align: left;
            }}
            .data-grid th.sortable {{
                cursor: pointer;
                user-select: none;
            }}
            .grid-toolbar, .grid-footer {{
                display: flex;
                align-items: center;
                gap: 0.5rem;
                padding: 0.5rem 0;
            }}
            .grid-footer {{
                justify-content: flex-end;
            }}
            .grid-actions {{
                display: flex;
                gap: 0.5rem;
            }}
            .grid-empty {{
                text-align: center;
                color: #787774;
            }}
            "#
        }
    }
}

fn sort_marker(sort: Option<SortModel>, field: &str) -> Element {
    match sort {
        Some(SortModel { field: f, direction }) if f == field => match direction {
            SortDirection::Ascending => rsx! { Icon { icon: FaArrowUp, width: 10, height: 10 } },
            SortDirection::Descending => rsx! { Icon { icon: FaArrowDown, width: 10, height: 10 } },
        },
        _ => rsx! {},
    }
}
