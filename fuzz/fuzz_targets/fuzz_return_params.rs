#![no_main]

use libfuzzer_sys::fuzz_target;

use bonetexture_orchestration::return_params::parse_return_parameters;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let params = parse_return_parameters(&text);
    for (name, value) in &params {
        assert!(!name.is_empty());
        assert_eq!(name.trim(), name);
        assert_eq!(value.trim(), value);
    }
});
