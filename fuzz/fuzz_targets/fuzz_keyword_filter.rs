//! Fuzz the keyword filter with arbitrary user-typed keywords.
//!
//! Any keyword, valid pattern or not, must filter without panicking and must
//! only ever drop products, never add or reorder them.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vismatch::{apply_filters, FilterCriteria, Product};

fuzz_target!(|data: &[u8]| {
    let Ok(keyword) = std::str::from_utf8(data) else {
        return;
    };

    let raw = vec![
        Product::new("p1", "Red Shirt", 0.72),
        Product::new("p2", "Blue Jeans", 0.45),
        Product::new("p3", "Shirt (Slim) [XL]", 0.61),
        Product::new("p4", "Überjacke", 0.30),
    ];
    let criteria = FilterCriteria {
        keyword: keyword.to_string(),
        min_similarity: 0.0,
    };

    let filtered = apply_filters(&raw, &criteria);
    assert!(filtered.len() <= raw.len());

    let mut rest = raw.iter();
    assert!(filtered.iter().all(|p| rest.any(|q| q == p)));
});
