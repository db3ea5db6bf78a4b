use serde_json::json;
use tog_attack::{AttackRequest, IterationBudget, TogError};
use tog_core::{AttackType, BoundingBox, BoxSpec};

#[test]
fn test_budget_from_json() {
    assert_eq!(IterationBudget::from_json(&json!("min")).unwrap(), IterationBudget::UntilConverged);
    assert_eq!(IterationBudget::from_json(&json!(0)).unwrap(), IterationBudget::Fixed(0));
    assert_eq!(IterationBudget::from_json(&json!(25)).unwrap(), IterationBudget::Fixed(25));
    assert_eq!(IterationBudget::from_json(&json!("25")).unwrap(), IterationBudget::Fixed(25));
}

#[test]
fn test_budget_rejects_garbage() {
    for value in [json!(3.5), json!("max"), json!(-3), json!(null), json!([1])] {
        let err = IterationBudget::from_json(&value).unwrap_err();
        assert!(matches!(err, TogError::InvalidIterationSpec(_)), "{}", value);
    }
}

#[test]
fn test_form_sentinel() {
    assert_eq!(IterationBudget::from_form_value("-1").unwrap(), IterationBudget::UntilConverged);
    assert_eq!(IterationBudget::from_form_value("min").unwrap(), IterationBudget::UntilConverged);
    assert_eq!(IterationBudget::from_form_value(" 10 ").unwrap(), IterationBudget::Fixed(10));
    assert!(IterationBudget::from_form_value("-2").is_err());
}

#[test]
fn test_request_with_rows() {
    let request = AttackRequest::parse(
        "fabrication",
        &json!(10),
        &json!([[1, 0.5, 0.5, 0.2, 0.2], [2, 0.25, 0.25, 0.1, 0.1]]),
    )
    .unwrap();
    assert_eq!(request.attack_type, AttackType::Fabrication);
    assert_eq!(request.budget, IterationBudget::Fixed(10));
    assert_eq!(request.boxes.fixed_len(), Some(2));
}

#[test]
fn test_request_boxes_only() {
    let request =
        AttackRequest::parse("fabrication", &json!("min"), &json!([[0.5, 0.5, 0.2, 0.2]]))
            .unwrap();
    assert_eq!(request.boxes, BoxSpec::Boxes(vec![BoundingBox::new(0.5, 0.5, 0.2, 0.2)]));
}

#[test]
fn test_request_unknown_attack() {
    let err = AttackRequest::parse("mislabel", &json!(1), &json!(null)).unwrap_err();
    assert!(matches!(err, TogError::InvalidAttackSpec(_)));
}

#[test]
fn test_vanishing_request_defaults_to_random_boxes() {
    let request = AttackRequest::vanishing(IterationBudget::default());
    assert_eq!(request.boxes, BoxSpec::Random);
    assert_eq!(request.budget, IterationBudget::UntilConverged);
}
