use anyhow::{anyhow, bail};
use clap::Parser;
use mahalla_nav::config::cli::Selector;
use mahalla_nav::domain::model::{DistrictId, NeighborhoodId, RegionId};
use mahalla_nav::domain::ports::Notice;
use mahalla_nav::utils::error::{ErrorSeverity, NavError};
use mahalla_nav::utils::{logger, validation::Validate};
use mahalla_nav::{
    CascadingLoader, CliConfig, ConsolePanel, Engine, HeadlessMap, HttpBackend, NavEvent,
    Navigator, UserEvent,
};
use std::sync::Arc;

type CliNavigator = Navigator<HttpBackend<mahalla_nav::TomlConfig>, HeadlessMap, ConsolePanel>;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,      // 輸入問題，只提示
        ErrorSeverity::Medium => 2,   // 網路錯誤，可重試
        ErrorSeverity::High => 1,     // 資料錯誤
        ErrorSeverity::Critical => 3, // 配置錯誤
    }
}

fn report_and_exit(e: &NavError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()).max(1));
}

/// Bail out if the last fetch left an error in the status slot.
fn ensure_loaded(nav: &CliNavigator) -> anyhow::Result<()> {
    match nav.engine().error() {
        Some(error) => bail!("{}", error),
        None => Ok(()),
    }
}

fn resolve<'a, T>(
    selector: &Selector,
    items: &'a [T],
    key: impl Fn(&T) -> (u64, &str),
    kind: &str,
) -> anyhow::Result<&'a T> {
    items
        .iter()
        .find(|item| {
            let (id, name) = key(item);
            selector.matches(id, name)
        })
        .ok_or_else(|| anyhow!("No {} matches {}", kind, selector))
}

async fn drill_down(nav: &mut CliNavigator, cli: &CliConfig) -> anyhow::Result<()> {
    let Some(selector) = &cli.region else {
        return Ok(());
    };
    let region: RegionId =
        resolve(selector, nav.engine().regions(), |r| (r.id.0, r.name.as_str()), "region")?.id;
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectRegion(region)));
    nav.settle().await;
    ensure_loaded(nav)?;

    let Some(selector) = &cli.district else {
        return Ok(());
    };
    let district: DistrictId =
        resolve(selector, nav.engine().districts(), |d| (d.id.0, d.name.as_str()), "district")?.id;
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectDistrict(district)));
    nav.settle().await;
    ensure_loaded(nav)?;

    let Some(selector) = &cli.neighborhood else {
        return Ok(());
    };
    let neighborhood: NeighborhoodId = resolve(
        selector,
        nav.engine().neighborhoods(),
        |n| (n.id.0, n.name.as_str()),
        "neighborhood",
    )?
    .id;
    nav.dispatch(UserEvent::Navigate(NavEvent::SelectNeighborhood(neighborhood)));

    for edit in &cli.edits {
        tracing::info!("✏️ {} = {:?}", edit.field, edit.value);
        nav.dispatch(UserEvent::EditField {
            id: neighborhood,
            field: edit.field,
            value: edit.value,
        });
    }

    if cli.submit {
        nav.dispatch(UserEvent::Submit(neighborhood));
        nav.settle().await;
        if let Some(Notice::SaveFailed { message, .. }) = nav.engine().panel().last_notice() {
            bail!("Saving prices failed: {}", message);
        }
        println!("💾 Prices saved for neighborhood {}", neighborhood);
    }

    Ok(())
}

fn print_summary(nav: &CliNavigator) {
    let engine = nav.engine();
    println!("📍 {}", engine.state());

    if let Some(panel) = engine.panel().render() {
        println!("{}", panel);
        return;
    }

    let rows: Vec<(u64, &str)> = if engine.state().district().is_some() {
        engine.neighborhoods().iter().map(|n| (n.id.0, n.name.as_str())).collect()
    } else if engine.state().region().is_some() {
        engine.districts().iter().map(|d| (d.id.0, d.name.as_str())).collect()
    } else {
        engine.regions().iter().map(|r| (r.id.0, r.name.as_str())).collect()
    };
    for (id, name) in rows {
        println!("  {:>6}  {}", id, name);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()).max(1));
        }
    };

    // 初始化日誌
    logger::init_with_level(
        settings.log_level(),
        cli.verbose,
        cli.json_logs || settings.json_logs(),
    );
    tracing::info!("Starting mahalla-nav CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| settings.validate()) {
        report_and_exit(&e);
    }

    let view = settings.view_settings();
    let concurrency = settings.price_concurrency();
    let backend = match HttpBackend::new(settings) {
        Ok(backend) => Arc::new(backend),
        Err(e) => report_and_exit(&e),
    };

    let engine = Engine::new(HeadlessMap::new(), ConsolePanel::new(), view);
    let mut nav = Navigator::new(engine, CascadingLoader::new(backend, concurrency));

    nav.start();
    nav.settle().await;
    ensure_loaded(&nav)?;

    drill_down(&mut nav, &cli).await?;
    print_summary(&nav);

    tracing::info!("✅ Done in state {}", nav.engine().state());
    Ok(())
}
