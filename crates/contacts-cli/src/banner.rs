use contacts_config::AppConfig;

/// Print the startup banner with a config summary.
pub fn print_banner(config: &AppConfig) {
    let version = env!("CARGO_PKG_VERSION");

    let url = format!("http://{}:{}", config.server.host, config.server.port);
    let db = shorten_home(&config.database.path.to_string_lossy());
    let migrations = config
        .migrations
        .dir
        .as_ref()
        .map(|dir| shorten_home(&dir.to_string_lossy()))
        .unwrap_or_else(|| "auto-detected".to_string());

    let width = 60;
    let inner = width - 4;

    let title = format!("Contacts v{version}");
    let title_dashes = width - 2 - title.len() - 5; // 2 for ╭╮, 5 for "─── " + " "
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let row = |text: &str| format!("│ {:<inner$} │", text);

    println!("{top}");
    println!("{}", row(""));
    println!("{}", row(&format!("API         {url}")));
    println!("{}", row(&format!("Database    {db}")));
    println!("{}", row(&format!("Migrations  {migrations}")));
    println!("{}", row(""));
    println!("{}", row("Press Ctrl+C to stop"));
    println!("{bottom}");
}

fn shorten_home(path: &str) -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => path.replace(&home, "~"),
        _ => path.to_string(),
    }
}
