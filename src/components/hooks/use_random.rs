use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

const PREFIX: &str = "cms"; // Must NOT contain "/" or "-"

/// Unique DOM id for one mounted element, e.g. `popup_cms_1234`.
pub fn use_random_id_for(element: &str) -> String {
    format!("{}_{PREFIX}_{}", element, generate_hash())
}

static COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_hash() -> u64 {
    let mut hasher = DefaultHasher::new();
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    counter.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = use_random_id_for("popup");
        let b = use_random_id_for("popup");
        assert_ne!(a, b);
        assert!(a.starts_with("popup_cms_"));
        assert!(!a.contains('-'));
    }
}
