//! `webshell run`: boot the plugin system and drive pages headlessly.

use anyhow::{Context, Result};
use tracing::info;
use webshell_plugins::ResourceKind;

use super::{Host, shutdown};
use crate::headless::{HeadlessChannel, HeadlessPage};
use crate::theme::Theme;

/// Load plugins, then deliver the page events for each URL in turn.
pub(crate) fn run_pages(host: &mut Host, urls: &[String]) -> Result<()> {
    let (manager, report) = host.boot()?;
    for name in &report.activated {
        println!("{}", Theme::success(&format!("Activated {name}")));
    }
    for (name, error) in &report.load_failures {
        println!("{}", Theme::error(&format!("{name}: {error}")));
    }
    for error in &report.activation_failures {
        println!("{}", Theme::error(&error.to_string()));
    }

    let result = urls.iter().try_for_each(|url| -> Result<()> {
        let mut page = HeadlessPage::new(url.as_str());
        let mut channel = HeadlessChannel::default();
        info!(url = %url, "Loading page");

        let mut manager = manager.borrow_mut();
        manager
            .before_load(&mut channel, &mut page)
            .with_context(|| format!("before_load failed for {url}"))?;
        manager
            .load_started(&mut page)
            .with_context(|| format!("load_started failed for {url}"))?;
        manager.bridge_initialize(&mut page);
        manager
            .load_finished(&mut page)
            .with_context(|| format!("load_finished failed for {url}"))?;

        print_page(url, &page, &channel);
        Ok(())
    });

    shutdown(&manager);
    result
}

fn print_page(url: &str, page: &HeadlessPage, channel: &HeadlessChannel) {
    println!("{}", Theme::header(url));
    for injection in page.injections() {
        let kind = match injection.kind {
            ResourceKind::Script => "script",
            ResourceKind::Stylesheet => "style",
        };
        println!(
            "  {:<7} {:<32} {}",
            kind,
            injection.name,
            Theme::dimmed(&injection.path.display().to_string())
        );
    }
    for name in channel.objects().keys() {
        println!("  {:<7} {name}", "object");
    }
    if page.injections().is_empty() && channel.objects().is_empty() {
        println!("  {}", Theme::dimmed("nothing injected"));
    }
}
