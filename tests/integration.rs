use std::{cell::RefCell, rc::Rc, str::from_utf8};

use minibank::{
    bin_utils::{ScriptError, Service},
    config::LedgerConfig,
    processor::LedgerError,
};

const TEST_FILE: &str = include_str!("ledger_script.csv");

#[test]
fn replay_ledger_script() {
    let mut output = Vec::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
        error_printer: Box::new(move |_line, err| sink.borrow_mut().push(err)),
    };
    service.run().unwrap();

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        vec![
            "account,holder,currency,balance,locked,transactions",
            "a-usd,alice,USD,30.00,false,3",
            "a-eur,alice,EUR,0.00,false,0",
            "b-usd,bob,USD,35.00,true,2",
        ]
    );

    let errors = errors.borrow();
    assert_eq!(errors.len(), 5);
    assert!(matches!(
        errors[0],
        ScriptError::Ledger(LedgerError::InsufficientFunds { .. })
    ));
    assert!(matches!(
        errors[1],
        ScriptError::Ledger(LedgerError::CurrencyMismatch { .. })
    ));
    assert!(matches!(&errors[2], ScriptError::UnknownAccount(alias) if alias == "ghost"));
    assert!(matches!(
        errors[3],
        ScriptError::Ledger(LedgerError::AccountLocked(_))
    ));
    assert!(matches!(
        errors[4],
        ScriptError::Ledger(LedgerError::DuplicateCurrencyAccount { .. })
    ));
}

#[test]
fn malformed_rows_do_not_stop_replay() {
    let script = "op,client,account,to,currency,amount\n\
                  client,alice,,,,\n\
                  open,alice,acc,,XYZ,\n\
                  open,alice,acc,,,\n\
                  open,alice,acc,,EUR,\n\
                  deposit,alice,acc,,,-5\n\
                  deposit,alice,acc,,,2.5\n";
    let mut output = Vec::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let service = Service {
        input: script.as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
        error_printer: Box::new(move |_line, err| sink.borrow_mut().push(err)),
    };
    service.run().unwrap();

    let errors = errors.borrow();
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], ScriptError::Parse(_)));
    assert!(matches!(
        errors[1],
        ScriptError::MissingColumn {
            column: "currency",
            ..
        }
    ));
    assert!(matches!(
        errors[2],
        ScriptError::Ledger(LedgerError::InvalidAmount { .. })
    ));

    let output = from_utf8(&output).unwrap();
    assert!(output.contains("acc,alice,EUR,2.50,false,1"));
}

#[test]
fn replay_keeps_exact_amounts() {
    let script = "op,client,account,to,currency,amount\n\
                  client,alice,,,,\n\
                  client,bob,,,,\n\
                  open,alice,big,,USD,\n\
                  open,bob,small,,USD,\n\
                  deposit,alice,big,,,12345678901234567.89\n\
                  deposit,alice,big,,,0.10\n\
                  transfer,alice,big,small,,0.001\n";
    let mut output = Vec::new();
    let service = Service {
        input: script.as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
        error_printer: Box::new(|line, err| panic!("line {line}: {err}")),
    };
    service.run().unwrap();

    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        vec![
            "account,holder,currency,balance,locked,transactions",
            "big,alice,USD,12345678901234567.989,false,3",
            "small,bob,USD,0.001,false,1",
        ]
    );
}
