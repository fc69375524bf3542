const STRING_KEYS: &[&str] = &[
    "WIFI_SSID",
    "WIFI_PASS",
    "NTP_HOST",
    "LEFT_TITLE",
    "RIGHT_TITLE",
    "ORIENTATION",
];

const INT_KEYS: &[&str] = &[
    "LEFT_UTC_OFFSET_HOURS",
    "RIGHT_UTC_OFFSET_HOURS",
    "TICK_SECS",
    "RESYNC_TICKS",
    "WIFI_MAX_ATTEMPTS",
    "NTP_MAX_ATTEMPTS",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=clock.local.rs");
    emit_local_settings_from_clock_local();
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}

fn emit_local_settings_from_clock_local() {
    let path = std::path::Path::new("clock.local.rs");
    let Ok(src) = std::fs::read_to_string(path) else {
        return;
    };

    for key in STRING_KEYS {
        if let Some(v) = extract_rust_str_const(&src, key) {
            println!("cargo:rustc-env=LOCAL_{}={}", key, v);
        }
    }
    for key in INT_KEYS {
        if let Some(v) = extract_rust_int_const(&src, key) {
            println!("cargo:rustc-env=LOCAL_{}={}", key, v);
        }
    }
}

fn const_line<'a>(src: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("pub const {}:", name);
    src.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//"))
        .find(|line| line.starts_with(&needle))
}

fn extract_rust_str_const(src: &str, name: &str) -> Option<String> {
    let line = const_line(src, name)?;
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')? + start + 1;
    Some(line[start + 1..end].to_string())
}

fn extract_rust_int_const(src: &str, name: &str) -> Option<String> {
    let line = const_line(src, name)?;
    let value = line.split('=').nth(1)?.trim().trim_end_matches(';').trim();
    let value = value.replace('_', "");
    value.parse::<i64>().ok().map(|v| v.to_string())
}
