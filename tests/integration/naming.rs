// Property tests for file name normalization and natural ordering

use proptest::prelude::*;
use squeeze::engine::{is_eligible, natural_cmp, normalize_name, temp_name_for};
use std::cmp::Ordering;

fn stem() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,12}"
}

fn extension() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"])
}

proptest! {
    #[test]
    fn normalization_is_idempotent(name in "[A-Za-z0-9 ._-]{0,24}") {
        let once = normalize_name(&name);
        prop_assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn repeated_extensions_collapse_to_one(stem in stem(), ext in extension(), repeats in 1usize..5) {
        let name = format!("{}{}", stem, format!(".{}", ext).repeat(repeats));
        prop_assert_eq!(normalize_name(&name), format!("{}.{}", stem, ext));
    }

    #[test]
    fn distinct_extensions_are_kept(stem in stem()) {
        let name = format!("{}.mkv.mp4", stem);
        prop_assert_eq!(normalize_name(&name), name.clone());
    }

    #[test]
    fn numbers_order_numerically(prefix in "[A-Za-z ]{0,8}", a in 0u32..100_000, b in 0u32..100_000) {
        let left = format!("{}{}", prefix, a);
        let right = format!("{}{}", prefix, b);
        prop_assert_eq!(natural_cmp(&left, &right), a.cmp(&b));
    }

    #[test]
    fn natural_order_is_antisymmetric(a in "[A-Za-z0-9 ]{0,12}", b in "[A-Za-z0-9 ]{0,12}") {
        prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
    }

    #[test]
    fn temporaries_are_never_eligible(stem in stem(), ext in extension()) {
        let temp = temp_name_for(&format!("{}.{}", stem, ext));
        prop_assert!(!is_eligible(&temp));
        prop_assert!(!temp.contains(' '));
    }
}

#[test]
fn module_names_sort_like_a_person_would() {
    let mut names = vec!["Module 10", "module 2", "Module 1", "Intro", "Module 02b"];
    names.sort_by(|a, b| natural_cmp(a, b));
    assert_eq!(
        names,
        vec!["Intro", "Module 1", "module 2", "Module 02b", "Module 10"]
    );
}

#[test]
fn leading_zeros_compare_equal_to_their_value() {
    assert_eq!(natural_cmp("clip007", "clip7"), Ordering::Equal);
    assert_eq!(natural_cmp("clip007", "clip8"), Ordering::Less);
}
