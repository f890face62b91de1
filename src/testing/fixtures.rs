//! Small example graphs used by tests and the `pst_viz` driver.

/// Two parallel branches merging again.
pub fn diamond() -> Vec<(&'static str, &'static str)> {
    vec![
        ("S", "A"),
        ("A", "B"),
        ("A", "C"),
        ("B", "D"),
        ("C", "D"),
        ("D", "T"),
    ]
}

/// A natural loop with header `A` and body `B`.
pub fn loop_graph() -> Vec<(&'static str, &'static str)> {
    vec![("S", "A"), ("A", "B"), ("B", "A"), ("A", "T")]
}

/// Three if-then-else diamonds in sequence, joined by explicit edges, so
/// the outer class has four members and splits into three sibling regions.
pub fn nested_diamonds() -> Vec<(&'static str, &'static str)> {
    vec![
        ("S", "A"),
        ("A", "B"),
        ("A", "C"),
        ("B", "D"),
        ("C", "D"),
        ("D", "E"),
        ("E", "F"),
        ("E", "G"),
        ("F", "H"),
        ("G", "H"),
        ("H", "I"),
        ("I", "J"),
        ("I", "K"),
        ("J", "L"),
        ("K", "L"),
        ("L", "T"),
    ]
}

/// Figure 1(a) of the Program Structure Tree paper.
pub fn paper_figure() -> Vec<(&'static str, &'static str)> {
    vec![
        ("start", "n1"),
        ("n1", "n2"),
        ("n1", "n3"),
        ("n2", "n4"),
        ("n3", "n5"),
        ("n4", "n6"),
        ("n5", "n7"),
        ("n5", "n8"),
        ("n6", "n9"),
        ("n6", "n10"),
        ("n7", "n11"),
        ("n8", "n11"),
        ("n9", "n12"),
        ("n10", "n12"),
        ("n11", "n13"),
        ("n12", "n14"),
        ("n13", "n8"),
        ("n13", "n15"),
        ("n14", "n2"),
        ("n14", "n16"),
        ("n15", "n16"),
        ("n16", "end"),
    ]
}
