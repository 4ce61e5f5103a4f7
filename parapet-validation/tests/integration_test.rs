//! Integration tests for parapet-validation

use parapet_validation::*;
use serde_json::json;

fn user_params() -> ParamSet {
    ParamSet::builder()
        .param("user_id", ParameterSpec::route(TypeDescriptor::INT).rule(Min::new(1)))
        .param(
            "username",
            ParameterSpec::json(TypeDescriptor::STR)
                .rule(MinLength(3))
                .rule(MaxLength(20)),
        )
        .param("email", ParameterSpec::json(TypeDescriptor::STR).rule(Email))
        .param(
            "role",
            ParameterSpec::json(TypeDescriptor::STR)
                .rule(In::new(["admin", "member"]).unwrap())
                .default("member"),
        )
        .param(
            "api_key",
            ParameterSpec::header(TypeDescriptor::STR).wire_name("X-Api-Key"),
        )
        .build()
        .unwrap()
}

fn user_request() -> RequestInputs {
    RequestInputs::new()
        .with_route("user_id", "17")
        .with_header("x-api-key", "k-123")
        .with_json(json!({
            "username": "ferris",
            "email": "ferris@example.com"
        }))
}

#[test]
fn test_full_request_succeeds() {
    let validated = Validator::new().check(&user_params(), &user_request()).unwrap();

    assert_eq!(validated.get_i64("user_id"), Some(17));
    assert_eq!(validated.get_str("username"), Some("ferris"));
    assert_eq!(validated.get_str("role"), Some("member"));
    assert_eq!(validated.get_str("api_key"), Some("k-123"));

    let names: Vec<&str> = validated.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["user_id", "username", "email", "role", "api_key"]);
}

#[test]
fn test_rule_failure_message() {
    let inputs = user_request().with_json(json!({
        "username": "fe",
        "email": "ferris@example.com"
    }));
    let response = Validator::new()
        .validate(&user_params(), &inputs)
        .into_result()
        .unwrap_err();

    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({"error": "In Json, 'username' length must be at least 3"})
    );
}

#[test]
fn test_route_conversion_failure() {
    let inputs = user_request().with_route("user_id", "seventeen");
    let err = Validator::new().check(&user_params(), &inputs).unwrap_err();
    assert_eq!(err.constraint(), "conversion");
    assert_eq!(err.field(), "user_id");
}

#[test]
fn test_in_rule_rejects_unknown_role() {
    let inputs = user_request().with_json(json!({
        "username": "ferris",
        "email": "ferris@example.com",
        "role": "owner"
    }));
    let err = Validator::new().check(&user_params(), &inputs).unwrap_err();
    assert_eq!(
        err.message(),
        "In Json, 'role' must be one of [\"admin\", \"member\"]"
    );
}

#[test]
fn test_missing_header_uses_wire_name() {
    let inputs = RequestInputs::new()
        .with_route("user_id", "17")
        .with_json(json!({"username": "ferris", "email": "ferris@example.com"}));
    let err = Validator::new().check(&user_params(), &inputs).unwrap_err();
    assert_eq!(err.message(), "Required Header parameter, 'X-Api-Key' not given.");
}

#[test]
fn test_json_containers() {
    let tags = TypeDescriptor::list_of(TypeDescriptor::STR).unwrap();
    let scores = TypeDescriptor::dict_of(TypeDescriptor::FLOAT).unwrap();
    let params = ParamSet::builder()
        .param("tags", ParameterSpec::json(tags).rule(MaxLength(3)))
        .param("scores", ParameterSpec::json(scores).optional(true))
        .build()
        .unwrap();
    let validator = Validator::new();

    let ok = validator
        .check(
            &params,
            &RequestInputs::new().with_json(json!({"tags": ["a", "b"], "scores": {"x": 1.5}})),
        )
        .unwrap();
    assert_eq!(ok.get_list("tags").map(<[Value]>::len), Some(2));
    assert_eq!(ok.get_dict("scores").map(|d| d.len()), Some(1));

    let err = validator
        .check(&params, &RequestInputs::new().with_json(json!({"tags": ["a", 1]})))
        .unwrap_err();
    assert_eq!(err.constraint(), "type");

    let err = validator
        .check(
            &params,
            &RequestInputs::new().with_json(json!({"tags": ["a", "b", "c", "d"]})),
        )
        .unwrap_err();
    assert_eq!(err.constraint(), "MaxLength");
}

#[test]
fn test_form_bool_and_float() {
    let params = ParamSet::builder()
        .param("subscribe", ParameterSpec::form(TypeDescriptor::BOOL))
        .param(
            "price",
            ParameterSpec::form(TypeDescriptor::FLOAT)
                .rule(Min::new(0.0))
                .rule(Max::new(99.5)),
        )
        .build()
        .unwrap();

    let inputs = RequestInputs::new()
        .with_form("subscribe", "True")
        .with_form("price", "12.25");
    let ok = Validator::new().check(&params, &inputs).unwrap();
    assert_eq!(ok.get_bool("subscribe"), Some(true));
    assert_eq!(ok.get_f64("price"), Some(12.25));

    let inputs = RequestInputs::new()
        .with_form("subscribe", "false")
        .with_form("price", "100");
    let err = Validator::new().check(&params, &inputs).unwrap_err();
    assert_eq!(err.message(), "In Form, 'price' must be at most 99.5");
}

#[test]
fn test_string_format_rules() {
    let params = ParamSet::builder()
        .param("zip", ParameterSpec::query(TypeDescriptor::STR).rule(Number))
        .param(
            "code",
            ParameterSpec::query(TypeDescriptor::STR).rule(Regex::new(r"^[A-Z]{3}$").unwrap()),
        )
        .param("when", ParameterSpec::query(TypeDescriptor::STR).rule(IsoDatetime))
        .param(
            "day",
            ParameterSpec::query(TypeDescriptor::STR).rule(Datetime::new("%Y-%m-%d").unwrap()),
        )
        .build()
        .unwrap();
    let validator = Validator::new();

    let good = RequestInputs::new()
        .with_query("zip", "02139")
        .with_query("code", "ABC")
        .with_query("when", "2024-02-29T10:30:00Z")
        .with_query("day", "2024-01-31");
    assert!(validator.check(&params, &good).is_ok());

    let bad_day = good.clone().with_query("day", "2024-02-30");
    assert_eq!(validator.check(&params, &bad_day).unwrap_err().constraint(), "Datetime");

    let bad_code = good.with_query("code", "abc");
    assert_eq!(validator.check(&params, &bad_code).unwrap_err().constraint(), "Regex");
}

#[test]
fn test_file_upload_rules() {
    let params = ParamSet::builder()
        .param(
            "photos",
            ParameterSpec::file()
                .rule(FileExtension::new(["png", "jpg"]).unwrap())
                .rule(MaxFileCount(2)),
        )
        .build()
        .unwrap();
    let validator = Validator::new();

    let png = || Attachment::new("a.PNG", "image/png", vec![0u8; 4]);

    let ok = validator
        .check(&params, &RequestInputs::new().with_file("photos", png()))
        .unwrap();
    assert_eq!(ok.files("photos").map(<[Attachment]>::len), Some(1));

    let too_many = RequestInputs::new()
        .with_file("photos", png())
        .with_file("photos", png())
        .with_file("photos", png());
    assert_eq!(
        validator.check(&params, &too_many).unwrap_err().constraint(),
        "MaxFileCount"
    );

    let empty = RequestInputs::new().with_file("photos", Attachment::new("", "", Vec::<u8>::new()));
    assert_eq!(
        validator.check(&params, &empty).unwrap_err().constraint(),
        "required"
    );
}

#[test]
fn test_registration_errors() {
    let header_list = ParameterSpec::header(TypeDescriptor::any_list()).build();
    assert!(matches!(header_list, Err(ConfigError::InvalidAnnotation { .. })));

    let bad_default = ParameterSpec::query(TypeDescriptor::INT).default("ten").build();
    assert!(matches!(bad_default, Err(ConfigError::InvalidDefault { .. })));

    let file_rule_on_str = ParameterSpec::form(TypeDescriptor::STR)
        .rule(MaxFileCount(1))
        .build();
    assert!(matches!(
        file_rule_on_str,
        Err(ConfigError::InvalidRuleAnnotation { .. })
    ));

    assert!(In::new(Vec::<Value>::new()).is_err());
    assert!(Regex::new("(").is_err());

    let duplicate = ParamSet::builder()
        .param("a", ParameterSpec::query(TypeDescriptor::STR))
        .param("a", ParameterSpec::form(TypeDescriptor::STR))
        .build();
    assert_eq!(duplicate.unwrap_err(), ConfigError::DuplicateParameter("a".to_string()));
}

#[test]
fn test_custom_provider() {
    struct Fixed(Value);

    impl RawValueProvider for Fixed {
        fn lookup(&self, _source: SourceKind, _key: &str) -> Option<&Value> {
            Some(&self.0)
        }

        fn files(&self, _name: &str) -> Option<&[Attachment]> {
            None
        }
    }

    let params = ParamSet::builder()
        .param("n", ParameterSpec::query(TypeDescriptor::INT))
        .build()
        .unwrap();
    let ok = Validator::new().check(&params, &Fixed(Value::from("9"))).unwrap();
    assert_eq!(ok.get_i64("n"), Some(9));

    let provider: &dyn RawValueProvider = &Fixed(Value::from("x"));
    assert!(Validator::new().check(&params, provider).is_err());
}
