use domain::DeviceFamily;
use gw_config::{AppConfig, ConfigError, DeviceConfig};

const SAMPLE: &str = r#"
[Elite]
IP = 192.168.1.20, 192.168.1.21,,192.168.1.20

[192.168.1.20]
Joint = 0,6
DI = 100,2 ; inline comment
DO = 102,2

[192.168.1.21]
Joint = 0,6

[Siemens1200]
IP = 192.168.1.50

[192.168.1.50]
Speed = 1,0,4
"#;

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("GW_HTTP_ADDR", "127.0.0.1:8081");
        std::env::set_var("GW_PING_TIMEOUT_MS", "250");
        std::env::set_var("GW_MODBUS_UNIT_ID", "3");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
    assert_eq!(config.ping_timeout_ms, 250);
    assert_eq!(config.modbus_unit_id, 3);
    assert_eq!(config.read_timeout_ms, 3000);
}

#[test]
fn device_config_builds_family_maps() {
    let config = DeviceConfig::from_ini_str(SAMPLE).expect("config");
    assert_eq!(
        config.families(),
        vec![DeviceFamily::Elite, DeviceFamily::Siemens1200]
    );

    let elite = config.address_map(DeviceFamily::Elite).expect("elite");
    let ips: Vec<&str> = elite.ips().collect();
    assert_eq!(ips, vec!["192.168.1.20", "192.168.1.21"]);

    let fields = elite.fields("192.168.1.20").expect("device");
    let tags: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(tags, vec!["Joint", "DI", "DO"]);
    assert_eq!(fields["DI"].params(), &[100, 2]);

    let s7 = config.address_map(DeviceFamily::Siemens1200).expect("s7");
    assert_eq!(s7.fields("192.168.1.50").expect("plc")["Speed"].params(), &[1, 0, 4]);
    assert!(config.address_map(DeviceFamily::Aubo).is_none());
}

#[test]
fn missing_device_section_is_fatal() {
    let text = "[Aubo]\nIP = 10.0.0.1,10.0.0.2\n[10.0.0.1]\nJoint = 0,6\n";
    let err = DeviceConfig::from_ini_str(text).expect_err("missing section");
    assert!(matches!(err, ConfigError::MissingSection(ip) if ip == "10.0.0.2"));
}

#[test]
fn invalid_address_is_fatal() {
    let text = "[XinJie]\nIP = 10.0.0.1\n[10.0.0.1]\nREAL = 0,abc\n";
    let err = DeviceConfig::from_ini_str(text).expect_err("invalid address");
    assert_eq!(err.to_string(), "invalid address [10.0.0.1] REAL = 0,abc");
}

#[test]
fn family_without_ip_key_is_empty() {
    let config = DeviceConfig::from_ini_str("[Fairino]\n").expect("config");
    let map = config.address_map(DeviceFamily::Fairino).expect("fairino");
    assert!(map.is_empty());
}
