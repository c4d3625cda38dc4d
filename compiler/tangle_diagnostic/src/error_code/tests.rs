use super::*;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E1001.to_string(), "E1001");
    assert_eq!(ErrorCode::E2003.as_str(), "E2003");
}

#[test]
fn test_every_code_belongs_to_exactly_one_phase() {
    for code in ErrorCode::ALL {
        let phases = [
            code.is_source_error(),
            code.is_parser_error(),
            code.is_grammar_error(),
            code.is_resolution_error(),
            code.is_warning(),
        ];
        assert_eq!(
            phases.iter().filter(|&&p| p).count(),
            1,
            "{code} must belong to one phase"
        );
    }
}

#[test]
fn test_phase_matches_leading_digit() {
    for code in ErrorCode::ALL {
        let s = code.as_str();
        match &s[..2] {
            "E0" => assert!(code.is_source_error()),
            "E1" => assert!(code.is_parser_error()),
            "E2" => assert!(code.is_grammar_error()),
            "E3" => assert!(code.is_resolution_error()),
            _ => assert!(code.is_warning()),
        }
    }
}

#[test]
fn test_from_str_round_trip() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
    assert_eq!("e1003".parse::<ErrorCode>(), Ok(ErrorCode::E1003));
    assert_eq!("E9999".parse::<ErrorCode>(), Err(()));
}

#[test]
fn test_descriptions_are_nonempty() {
    for code in ErrorCode::ALL {
        assert!(!code.description().is_empty());
    }
}
