use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brisk", "calm", "clever", "crisp", "deep", "eager", "fair", "keen",
    "lively", "mellow", "quiet", "solid", "swift", "vivid",
];

const NOUNS: &[&str] = &[
    "basin", "cedar", "comet", "delta", "ember", "falcon", "garnet", "harbor", "lantern",
    "meadow", "orchid", "pebble", "quarry", "ridge", "sparrow", "willow",
];

/// A short human-readable handle for a card, so saved answers have a name
/// before the user thinks of one.
pub fn display_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    format!("{adjective}-{noun}-{:02}", rng.random_range(0..100u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_have_three_segments() {
        for _ in 0..32 {
            let name = display_name();
            let parts: Vec<&str> = name.split('-').collect();
            assert_eq!(parts.len(), 3, "unexpected shape: {name}");
            assert!(parts.iter().all(|part| !part.is_empty()));
        }
    }
}
