use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["market-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn parses_sales_command_with_username() {
    let cli = Cli::try_parse_from(["market-cli", "sales", "--username", "maker"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Sales { ref username } if username == "maker"));
}

#[test]
fn sales_requires_username() {
    assert!(Cli::try_parse_from(["market-cli", "sales"]).is_err());
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["market-cli"]).is_err());
}
