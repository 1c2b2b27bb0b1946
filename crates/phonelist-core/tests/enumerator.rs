use std::collections::HashSet;

use phonelist_core::{AreaCode, CountryCode, DialingPlan, Enumerator, Error};

fn toy_plan() -> DialingPlan {
    DialingPlan::new(3, 2).expect("toy plan")
}

fn codes(plan: &DialingPlan) -> (CountryCode, AreaCode) {
    let country = CountryCode::parse("1").expect("country code");
    let area = AreaCode::parse("212", plan).expect("area code");
    (country, area)
}

#[test]
fn enumerates_full_toy_space_in_order() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);

    let numbers: Vec<String> = Enumerator::new(&plan, &country, &area)
        .expect("enumerator")
        .map(|candidate| candidate.to_string())
        .collect();

    assert_eq!(numbers.len(), 100);
    assert_eq!(numbers.first().map(String::as_str), Some("121200"));
    assert_eq!(numbers.get(1).map(String::as_str), Some("121201"));
    assert_eq!(numbers.last().map(String::as_str), Some("121299"));
}

#[test]
fn yields_distinct_strictly_ascending_values() {
    for digits in 1..=4 {
        let plan = DialingPlan::new(3, digits).expect("plan");
        let (country, area) = codes(&plan);
        let values: Vec<u64> = Enumerator::new(&plan, &country, &area)
            .expect("enumerator")
            .map(|candidate| candidate.to_string().parse::<u64>().expect("numeric"))
            .collect();

        assert_eq!(values.len() as u64, 10_u64.pow(digits as u32));
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
        let unique: HashSet<u64> = values.iter().copied().collect();
        assert_eq!(unique.len(), values.len());
    }
}

#[test]
fn candidates_expose_their_subscriber_offset() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);
    let offsets: Vec<u64> = Enumerator::range(&plan, &country, &area, 40, 43)
        .expect("range")
        .map(|candidate| candidate.subscriber())
        .collect();
    assert_eq!(offsets, vec![40, 41, 42]);
}

#[test]
fn restarts_from_offset_without_prior_elements() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);

    let full: Vec<String> = Enumerator::new(&plan, &country, &area)
        .expect("enumerator")
        .map(|candidate| candidate.to_string())
        .collect();
    let resumed: Vec<String> = Enumerator::starting_at(&plan, &country, &area, 37)
        .expect("enumerator")
        .map(|candidate| candidate.to_string())
        .collect();

    assert_eq!(resumed, full[37..]);
}

#[test]
fn reports_exact_remaining_length() {
    let plan = DialingPlan::default();
    let (country, area) = codes(&plan);

    let mut enumerator =
        Enumerator::range(&plan, &country, &area, 2_500_000, 5_000_000).expect("enumerator");
    assert_eq!(enumerator.len(), 2_500_000);
    enumerator.next();
    assert_eq!(enumerator.len(), 2_499_999);
    assert_eq!(enumerator.position(), 2_500_001);
}

#[test]
fn fill_matches_iterator_output() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);

    let mut buf = Vec::new();
    let mut enumerator = Enumerator::new(&plan, &country, &area).expect("enumerator");
    while enumerator.fill(&mut buf, 7) > 0 {}

    let mut expected = Vec::new();
    for candidate in Enumerator::new(&plan, &country, &area).expect("enumerator") {
        candidate.write_line(&mut expected);
    }
    assert_eq!(buf, expected);
}

#[test]
fn plus_prefix_is_optional() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);

    let first = Enumerator::new(&plan, &country, &area)
        .expect("enumerator")
        .with_plus_prefix(true)
        .next()
        .expect("first candidate");
    assert_eq!(first.to_string(), "+121200");
}

#[test]
fn rejects_range_outside_space() {
    let plan = toy_plan();
    let (country, area) = codes(&plan);

    let err = Enumerator::range(&plan, &country, &area, 50, 101).expect_err("end past space");
    assert!(matches!(err, Error::InvalidConfig(_)));
    let err = Enumerator::range(&plan, &country, &area, 60, 50).expect_err("start after end");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn rejects_area_code_from_another_plan() {
    let seven = DialingPlan::default();
    let (country, area) = codes(&seven);
    let four_digit_areas = DialingPlan::new(4, 7).expect("plan");

    let err = Enumerator::new(&four_digit_areas, &country, &area).expect_err("length mismatch");
    assert!(matches!(err, Error::InvalidConfig(_)));
}
