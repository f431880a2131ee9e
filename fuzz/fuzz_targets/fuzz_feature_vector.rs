#![no_main]

use libfuzzer_sys::fuzz_target;

use bonetexture_core::features::{FeatureVector, FilterKind};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for kind in FilterKind::ALL {
        // Should not panic; a parsed vector always has the family's length
        if let Ok(vector) = FeatureVector::parse(kind, text) {
            assert_eq!(vector.values().len(), kind.feature_count());
            assert_eq!(vector.named().count(), kind.feature_count());
        }
    }
});
