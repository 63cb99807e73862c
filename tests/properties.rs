use line_recon::{
    category::{LineCategory, categorize},
    columns::resolve,
    data::parse_quantity,
    frame::Cell,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn numbered_front_lines_are_front(n in 1u32..=36, spaces in 0usize..3) {
        let label = format!("LINE{}{:02}", " ".repeat(spaces), n);
        prop_assert_eq!(categorize(Some(label.as_str())), LineCategory::Front);
    }

    #[test]
    fn lines_past_thirty_six_are_back(n in 37u32..=99) {
        let label = format!("LINE {n:02}");
        prop_assert_eq!(categorize(Some(label.as_str())), LineCategory::Back);
    }

    #[test]
    fn parse_quantity_never_fails(raw in ".{0,16}") {
        let value = parse_quantity(&Cell::text(&raw));
        prop_assert!(value.is_finite());
    }

    #[test]
    fn grouped_locale_integers_parse_back(n in 0u64..1_000_000_000) {
        let digits = n.to_string();
        let mut grouped = String::new();
        for (idx, digit) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }
        let text = format!("{grouped},5");
        prop_assert_eq!(parse_quantity(&Cell::text(&text)), n as f64 + 0.5);
    }

    #[test]
    fn exact_header_wins_regardless_of_position(
        noise in proptest::collection::vec("[a-z]{1,6}", 0..5),
        at in 0usize..6,
    ) {
        let mut headers = noise
            .iter()
            .map(|n| format!("Material {n}"))
            .collect::<Vec<_>>();
        let at = at.min(headers.len());
        headers.insert(at, "material".to_string());
        let found = resolve(&headers, &["Material"]);
        prop_assert_eq!(found.as_deref(), Some("material"));
    }
}
