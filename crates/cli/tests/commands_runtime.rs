use kirana_cli::commands;

// All commands run in one test because they share the KIRANA_DATABASE_URL
// environment override.
#[test]
fn commands_run_against_an_in_memory_database() {
    std::env::set_var("KIRANA_DATABASE_URL", "sqlite::memory:?cache=shared");

    let migrate = commands::migrate::run();
    assert_eq!(migrate.exit_code, 0, "migrate failed: {}", migrate.output);
    assert!(migrate.output.contains("\"status\":\"ok\""));

    let seed = commands::seed::run();
    assert_eq!(seed.exit_code, 0, "seed failed: {}", seed.output);
    assert!(seed.output.contains("demo dataset loaded"));

    let doctor = commands::doctor::run(true);
    assert_eq!(doctor.exit_code, 0, "doctor failed: {}", doctor.output);
    assert!(doctor.output.contains("\"status\": \"ready\""));

    let config_output = commands::config::run();
    assert!(config_output.contains("database.url"));
    assert!(config_output.contains("env (KIRANA_DATABASE_URL)"));

    std::env::remove_var("KIRANA_DATABASE_URL");
}
