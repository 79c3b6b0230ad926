use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Built-in topic pool for the channel. One entry is used per run.
pub const TOPICS: &[&str] = &[
    "How to replace a USB port on a smartphone",
    "Diagnosing a short circuit on a laptop motherboard",
    "Rescuing an SSD after reversed polarity",
    "Why capacitors bulge and how to pick replacements",
    "Reballing BGA chips at home",
];

pub(crate) fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Picks a topic not present in `seen`. When every topic has been used the
/// pool wraps around and any topic may repeat.
pub fn pick_new_topic(seen: &[String]) -> String {
    pick_with_rng(seen, &mut rand::rngs::StdRng::seed_from_u64(now_seed()))
}

fn pick_with_rng<R: Rng>(seen: &[String], rng: &mut R) -> String {
    let fresh: Vec<&str> = TOPICS
        .iter()
        .copied()
        .filter(|t| !seen.iter().any(|s| s == t))
        .collect();

    let pool: &[&str] = if fresh.is_empty() { TOPICS } else { &fresh };
    pool[rng.gen_range(0..pool.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn skips_seen_topics() {
        let seen: Vec<String> = TOPICS[..TOPICS.len() - 1]
            .iter()
            .map(|t| t.to_string())
            .collect();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_with_rng(&seen, &mut rng);
            assert_eq!(picked, TOPICS[TOPICS.len() - 1]);
        }
    }

    #[test]
    fn falls_back_when_all_seen() {
        let seen: Vec<String> = TOPICS.iter().map(|t| t.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pick_with_rng(&seen, &mut rng);
        assert!(TOPICS.contains(&picked.as_str()));
    }

    #[test]
    fn picks_from_pool_when_nothing_seen() {
        let mut rng = StdRng::seed_from_u64(1);
        let picked = pick_with_rng(&[], &mut rng);
        assert!(TOPICS.contains(&picked.as_str()));
    }
}
