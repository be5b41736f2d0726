use watchrun::console::{ConsoleCommand, parse_command};

#[test]
fn known_commands_and_aliases_parse() {
    assert_eq!(parse_command("clear"), Some(ConsoleCommand::Clear));
    assert_eq!(parse_command("cls"), Some(ConsoleCommand::Clear));
    assert_eq!(parse_command("help"), Some(ConsoleCommand::Help));
    assert_eq!(parse_command("h"), Some(ConsoleCommand::Help));
    assert_eq!(parse_command("?"), Some(ConsoleCommand::Help));
    assert_eq!(parse_command("status"), Some(ConsoleCommand::Status));
    assert_eq!(parse_command("stats"), Some(ConsoleCommand::Status));
    assert_eq!(parse_command("last-change"), Some(ConsoleCommand::LastChange));
    assert_eq!(parse_command("lc"), Some(ConsoleCommand::LastChange));
    assert_eq!(parse_command("rs"), Some(ConsoleCommand::Restart));
    assert_eq!(parse_command("stop"), Some(ConsoleCommand::Stop));
    assert_eq!(parse_command("x"), Some(ConsoleCommand::Stop));
}

#[test]
fn commands_are_case_insensitive_and_trimmed() {
    assert_eq!(parse_command("  RS  "), Some(ConsoleCommand::Restart));
    assert_eq!(parse_command("Stop"), Some(ConsoleCommand::Stop));
    assert_eq!(parse_command("LAST-CHANGE"), Some(ConsoleCommand::LastChange));
}

#[test]
fn silent_toggles_or_forces() {
    assert_eq!(parse_command("silent"), Some(ConsoleCommand::Silent(None)));
    assert_eq!(
        parse_command("silent on"),
        Some(ConsoleCommand::Silent(Some(true)))
    );
    assert_eq!(
        parse_command("SILENT OFF"),
        Some(ConsoleCommand::Silent(Some(false)))
    );
    assert_eq!(
        parse_command("silent loudly"),
        Some(ConsoleCommand::Unknown("silent loudly".to_string()))
    );
}

#[test]
fn blank_lines_are_ignored() {
    assert_eq!(parse_command(""), None);
    assert_eq!(parse_command("   "), None);
    assert_eq!(parse_command("\t"), None);
}

#[test]
fn anything_else_is_reported_verbatim() {
    assert_eq!(
        parse_command("restart please"),
        Some(ConsoleCommand::Unknown("restart please".to_string()))
    );
    assert_eq!(
        parse_command("rs now"),
        Some(ConsoleCommand::Unknown("rs now".to_string()))
    );
}
