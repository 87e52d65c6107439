//! End-to-end grid behaviour through its public event surface.

use serde_json::json;
use vgrid::{
    CellTemplate, ColumnDef, GridConfig, GridEvent, Measurement, PageEvent, SortDirection,
    TemplateSlot, WindowPolicy, row::value_text,
};

use crate::helpers::{Clock, grid, shared};

#[test]
fn columns_inferred_from_first_row() {
    let clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(
        shared(json!([
            {"id": 1, "name": "Al"},
            {"id": 2, "name": "Bo"},
            {"id": 3, "name": "Cy"},
        ])),
        clock.now,
    );
    assert_eq!(g.columns().columns(), vec!["id", "name"]);
    assert_eq!(g.displayed_len(), 3);
}

#[test]
fn change_page_offset() {
    let clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(shared(json!([{"id": 1}])), clock.now);
    let offset = g.change_page(
        PageEvent {
            page_index: 2,
            page_size: 50,
        },
        clock.now,
    );
    assert_eq!(offset, 2 * 50 * 47 + 56);
    assert_eq!(offset, 4756);
}

#[test]
fn sparse_boundary_matches_fall_back_to_substrings() {
    let mut data = Vec::new();
    for i in 0..40 {
        data.push(json!({"w": format!("abc{i}")}));
    }
    for i in 0..30 {
        data.push(json!({"w": format!("zab{i}")}));
    }
    for i in 0..30 {
        data.push(json!({"w": format!("nope{i}")}));
    }
    let mut clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(shared(json!(data)), clock.now);

    g.on_filter_input("ab", clock.now);
    clock.advance(&mut g, 150);
    let events = clock.advance(&mut g, 200);
    assert!(events.contains(&GridEvent::ActiveViewChanged { len: 70 }));
    assert_eq!(g.displayed_len(), 70);
}

#[test]
fn plentiful_boundary_matches_are_kept() {
    let mut data = Vec::new();
    for i in 0..60 {
        data.push(json!({"w": format!("abc{i}")}));
    }
    for i in 0..10 {
        data.push(json!({"w": format!("zab{i}")}));
    }
    let mut clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(shared(json!(data)), clock.now);
    g.on_filter_input("AB", clock.now);
    clock.advance(&mut g, 150);
    clock.advance(&mut g, 200);
    assert_eq!(g.store().active_len(), 60);
}

#[test]
fn filter_keystrokes_coalesce_into_one_recompute() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(
        shared(json!([{"n": "alpha"}, {"n": "alps"}, {"n": "beta"}])),
        clock.now,
    );
    let mut recomputes = 0;
    for text in ["a", "al", "alp", "alph"] {
        g.on_filter_input(text, clock.now);
        recomputes += clock
            .advance(&mut g, 100)
            .iter()
            .filter(|e| matches!(e, GridEvent::ActiveViewChanged { .. }))
            .count();
    }
    for _ in 0..5 {
        recomputes += clock
            .advance(&mut g, 100)
            .iter()
            .filter(|e| matches!(e, GridEvent::ActiveViewChanged { .. }))
            .count();
    }
    assert_eq!(recomputes, 1);
    assert_eq!(g.store().filter_text(), "alph");
    assert_eq!(g.displayed_len(), 1);
}

#[test]
fn paged_window_grows_while_scrolling() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig {
        windowing: WindowPolicy::Paged,
        item_size: 1,
        header_size: 0,
        ..GridConfig::default()
    });
    let data: Vec<_> = (0..180).map(|i| json!({"i": i})).collect();
    g.set_rows(shared(json!(data)), clock.now);
    g.on_viewport_resize(80.0, 10, clock.now);
    assert_eq!(g.displayed_len(), 50);

    g.scroll_by_rows(35, clock.now);
    assert!(g.is_pending());
    let events = clock.advance(&mut g, 250);
    assert!(events.contains(&GridEvent::DisplayedChanged { len: 100 }));
    assert!(!g.is_pending());

    let mut last = g.displayed_len();
    for _ in 0..20 {
        g.scroll_by_rows(10, clock.now);
        clock.advance(&mut g, 250);
        assert!(g.displayed_len() >= last);
        assert!(g.displayed_len() <= g.store().active_len());
        last = g.displayed_len();
    }
    assert_eq!(last, 180);
}

#[test]
fn sort_then_none_restores_dataset_order() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(
        shared(json!([{"n": "b"}, {"n": "c"}, {"n": "a"}])),
        clock.now,
    );
    g.on_sort_change("n", SortDirection::Descending, clock.now);
    clock.advance(&mut g, 200);
    let order: Vec<_> = (0..3)
        .filter_map(|i| g.displayed_row(i))
        .map(|r| value_text(&r["n"]))
        .collect();
    assert_eq!(order, ["c", "b", "a"]);

    g.on_sort_change("n", SortDirection::None, clock.now);
    clock.advance(&mut g, 200);
    let order: Vec<_> = (0..3)
        .filter_map(|i| g.displayed_row(i))
        .map(|r| value_text(&r["n"]))
        .collect();
    assert_eq!(order, ["b", "c", "a"]);
}

#[test]
fn templates_render_and_unknown_fields_drop() {
    let clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_templates(vec![
        TemplateSlot {
            column: "price".into(),
            template: CellTemplate::new(|v| format!("${}", value_text(v))),
        },
        TemplateSlot {
            column: "nope".into(),
            template: CellTemplate::new(|_| "x".into()),
        },
    ]);
    g.set_rows(shared(json!([{"item": "tea", "price": 3}])), clock.now);
    let row = g.displayed_row(0).cloned().unwrap_or_default();
    let cells: Vec<_> = g.columns().defs().iter().map(|c| c.render_cell(&row)).collect();
    assert_eq!(cells, ["tea", "$3"]);
    assert!(g.columns().by_field("nope").is_none());
}

#[test]
fn measurement_fills_viewport_and_respects_user_widths() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig::default());
    g.set_rows(
        shared(json!([{"a": "x", "b": "yyyy"}, {"a": "xxx", "b": "y"}])),
        clock.now,
    );
    g.on_viewport_resize(200.0, 5, clock.now);
    let events = clock.advance(&mut g, 0);
    assert!(events.contains(&GridEvent::MeasureDue { force: false }));

    let rendered: Vec<Vec<vgrid::RenderedCell>> = (0..2)
        .filter_map(|i| g.displayed_row(i).cloned())
        .map(|r| {
            g.columns()
                .defs()
                .iter()
                .map(|c| vgrid::RenderedCell::new(c.render_cell(&r), vgrid::FontSpec::monospace()))
                .collect()
        })
        .collect();
    let ten_per_char = |t: &str, _: &vgrid::FontSpec| t.chars().count() as f32 * 10.0;
    let m = g.measure_columns(&rendered, &ten_per_char, false, clock.now);
    // 30 + 40 measured, (200 - 70 - 20) / 2 = 55 each on top
    assert_eq!(m, Measurement::Measured(vec![85.0, 95.0]));

    g.header_hover(0, 84.0, 85.0);
    assert!(g.header_pointer_down(0, 85.0, &[85.0, 95.0]));
    g.pointer_move(95.0);
    g.pointer_up(clock.now);
    assert_eq!(g.columns().widths(), vec![Some(95.0), Some(85.0)]);

    g.measure_columns(&rendered, &ten_per_char, false, clock.now);
    assert_eq!(g.columns().widths(), vec![Some(95.0), Some(85.0)]);

    g.on_viewport_resize(300.0, 5, clock.now);
    let events = clock.advance(&mut g, 0);
    assert!(events.contains(&GridEvent::MeasureDue { force: true }));
    g.measure_columns(&rendered, &ten_per_char, true, clock.now);
    assert_eq!(g.columns().widths(), vec![Some(135.0), Some(145.0)]);
}

#[test]
fn explicit_columns_restrict_filtering() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig {
        filterable: false,
        columns: Some(vec![
            ColumnDef::new("id", "Id"),
            ColumnDef::new("name", "Name").filterable(true),
        ]),
        ..GridConfig::default()
    });
    g.set_rows(
        shared(json!([{"id": "bob", "name": "al"}, {"id": "x", "name": "bob"}])),
        clock.now,
    );
    g.on_filter_input("bob", clock.now);
    clock.advance(&mut g, 150);
    clock.advance(&mut g, 200);
    assert_eq!(g.displayed_len(), 1);
    assert_eq!(g.displayed_row(0).map(|r| value_text(&r["id"])).as_deref(), Some("x"));
}

#[test]
fn filtering_disabled_ignores_input() {
    let mut clock = Clock::new();
    let mut g = grid(GridConfig {
        filterable: false,
        ..GridConfig::default()
    });
    g.set_rows(shared(json!([{"n": "a"}, {"n": "b"}])), clock.now);
    g.on_filter_input("a", clock.now);
    let events = clock.advance(&mut g, 150);
    assert!(!events.contains(&GridEvent::Pending));
    assert!(!g.is_pending());
    clock.advance(&mut g, 1000);
    assert_eq!(g.displayed_len(), 2);
}
