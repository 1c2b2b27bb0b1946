use phonelist_core::{AreaCode, CountryCode, DialingPlan, Error};

#[test]
fn rejects_short_area_code() {
    let plan = DialingPlan::default();
    let err = AreaCode::parse("21", &plan).expect_err("two digits when three expected");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn rejects_long_or_non_numeric_area_code() {
    let plan = DialingPlan::default();
    assert!(AreaCode::parse("2125", &plan).is_err());
    assert!(AreaCode::parse("2a2", &plan).is_err());
    assert!(AreaCode::parse("", &plan).is_err());
}

#[test]
fn accepts_area_code_with_surrounding_whitespace() {
    let plan = DialingPlan::default();
    let area = AreaCode::parse(" 212 ", &plan).expect("area code");
    assert_eq!(area.as_str(), "212");
}

#[test]
fn validates_country_codes() {
    assert_eq!(CountryCode::parse("44").expect("uk").as_str(), "44");
    assert!(CountryCode::parse("0").is_err());
    assert!(CountryCode::parse("+1").is_err());
    assert!(CountryCode::parse("1234").is_err());
    assert!(CountryCode::parse("").is_err());
}

#[test]
fn rejects_out_of_bounds_plan() {
    assert!(DialingPlan::new(0, 7).is_err());
    assert!(DialingPlan::new(3, 0).is_err());
    assert!(DialingPlan::new(3, 19).is_err());
    assert_eq!(
        DialingPlan::new(3, 18).expect("max plan").space_size(),
        1_000_000_000_000_000_000
    );
}

#[test]
fn plan_serializes_with_field_names() {
    let json = serde_json::to_string(&DialingPlan::default()).expect("serialize plan");
    assert_eq!(json, r#"{"area_code_digits":3,"subscriber_digits":7}"#);
}
