//! Command handlers. Each one stands in for a page of the web app and is
//! gated by the same navigation guard.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::Local;

use findwarranty_core::assets::{AssetCache, HttpAssetSource};
use findwarranty_core::models::{Attachment, Receipt, ReceiptForm};
use findwarranty_core::router::NavigationDecision;
use findwarranty_core::{AppContext, Config};

use crate::format::{format_date, format_money, truncate_string};
use crate::ReceiptArgs;

/// Environment variable consulted before prompting for a password
const ENV_PASSWORD: &str = "FINDWARRANTY_PASSWORD";

/// Column widths for the receipt table
const STORE_WIDTH: usize = 18;
const PRODUCT_WIDTH: usize = 22;
const CATEGORY_WIDTH: usize = 12;

/// Fail unless the guard lets the current session open `route`.
async fn require_route(ctx: &AppContext, route: &str) -> Result<()> {
    match ctx.navigate(route).await {
        NavigationDecision::Proceed => Ok(()),
        NavigationDecision::Redirect(to) if to == "/login" => {
            bail!("Not signed in. Run `findwarranty login` first.")
        }
        NavigationDecision::Redirect(to) => bail!("Redirected to {}", to),
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(name) => print!("Username [{}]: ", name),
        None => print!("Username: "),
    }
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let entered = line.trim();
    match (entered.is_empty(), default) {
        (true, Some(name)) => Ok(name.to_string()),
        (true, None) => bail!("Username required"),
        (false, _) => Ok(entered.to_string()),
    }
}

pub async fn login(ctx: &AppContext, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => prompt_username(ctx.config.last_username.as_deref())?,
    };
    let password = read_password()?;

    let user = ctx
        .login(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e.detail()))?;
    remember_username(&username);
    println!("Signed in as {} (id {})", user.username, user.id);
    Ok(())
}

pub async fn register(ctx: &AppContext, username: &str) -> Result<()> {
    let password = read_password()?;
    let user = ctx
        .register(username, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Registration failed: {}", e.detail()))?;
    remember_username(username);
    println!("Account created. Signed in as {} (id {})", user.username, user.id);
    Ok(())
}

fn remember_username(username: &str) {
    if let Err(e) = Config::remember_username(username) {
        tracing::warn!(error = %e, "Failed to save config");
    }
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.logout().await;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.current_user().await {
        Some(user) => println!("{} (id {})", user.username, user.id),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    require_route(ctx, "/receipts").await?;
    ctx.fetch_receipts()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load receipts: {}", e.detail()))?;

    let receipts = ctx.receipts.receipts().await;
    if receipts.is_empty() {
        println!("No receipts yet. Add one with `findwarranty add`.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    println!(
        "{:>5}  {:<sw$}  {:<pw$}  {:<cw$}  {:>10}  {:<12}  {}",
        "ID", "Store", "Product", "Category", "Price", "Purchased", "Warranty",
        sw = STORE_WIDTH,
        pw = PRODUCT_WIDTH,
        cw = CATEGORY_WIDTH,
    );
    for receipt in &receipts {
        print_row(receipt, today);
    }
    Ok(())
}

fn print_row(receipt: &Receipt, today: chrono::NaiveDate) {
    let warranty = match receipt.expiry_date() {
        Some(expiry) => format!("{} ({})", format_date(Some(expiry)), receipt.warranty_status(today)),
        None => receipt.warranty_status(today).to_string(),
    };
    let attachment = if receipt.has_attachment() { " [file]" } else { "" };
    println!(
        "{:>5}  {:<sw$}  {:<pw$}  {:<cw$}  {:>10}  {:<12}  {}{}",
        receipt.id,
        truncate_string(&receipt.store_name, STORE_WIDTH),
        truncate_string(&receipt.product_name, PRODUCT_WIDTH),
        truncate_string(&receipt.category, CATEGORY_WIDTH),
        receipt.display_price(),
        format_date(receipt.purchase_date),
        warranty,
        attachment,
        sw = STORE_WIDTH,
        pw = PRODUCT_WIDTH,
        cw = CATEGORY_WIDTH,
    );
}

fn build_form(args: ReceiptArgs) -> Result<ReceiptForm> {
    let attachment = match args.file {
        Some(ref path) => Some(Attachment::from_path(path)?),
        None => None,
    };
    Ok(ReceiptForm {
        store_name: args.store,
        product_name: args.product,
        purchase_date: args.date,
        price: args.price,
        category: args.category,
        warranty_duration: args.warranty,
        attachment,
    })
}

pub async fn add(ctx: &AppContext, args: ReceiptArgs) -> Result<()> {
    require_route(ctx, "/create").await?;
    let form = build_form(args)?;
    let receipt = ctx
        .create_receipt(&form)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save receipt: {}", e.detail()))?;

    println!("Saved receipt {}", receipt.id);
    if let Some(expiry) = receipt.expiry_date() {
        println!("Warranty expires {}", format_date(Some(expiry)));
    }
    Ok(())
}

pub async fn edit(ctx: &AppContext, id: i64, args: ReceiptArgs) -> Result<()> {
    require_route(ctx, "/receipts").await?;
    let form = build_form(args)?;
    let receipt = ctx
        .update_receipt(id, &form)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update receipt {}: {}", id, e.detail()))?;
    println!("Updated receipt {}", receipt.id);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: i64) -> Result<()> {
    require_route(ctx, "/receipts").await?;
    ctx.delete_receipt(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete receipt {}: {}", id, e.detail()))?;
    println!("Deleted receipt {}", id);
    Ok(())
}

pub async fn stats(ctx: &AppContext) -> Result<()> {
    require_route(ctx, "/stats").await?;
    ctx.fetch_receipts()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load receipts: {}", e.detail()))?;

    let today = Local::now().date_naive();
    let stats = ctx.stats(today).await;

    println!("Receipts:        {}", stats.count);
    println!("Total spend:     {}", format_money(stats.total_spend));
    println!("Active:          {}", stats.active);
    println!("Expiring soon:   {}", stats.expiring_soon);
    println!("Expired:         {}", stats.expired);
    println!("No expiry known: {}", stats.unknown_expiry);

    if !stats.by_category.is_empty() {
        println!();
        println!("{:<cw$}  {:>5}  {:>10}", "Category", "Count", "Spend", cw = CATEGORY_WIDTH);
        for category in &stats.by_category {
            println!(
                "{:<cw$}  {:>5}  {:>10}",
                truncate_string(&category.category, CATEGORY_WIDTH),
                category.count,
                format_money(category.spend),
                cw = CATEGORY_WIDTH,
            );
        }
    }
    Ok(())
}

pub async fn route(ctx: &AppContext, path: &str) -> Result<()> {
    match ctx.navigate(path).await {
        NavigationDecision::Proceed => println!("{} -> allowed", path),
        NavigationDecision::Redirect(to) => println!("{} -> redirect to {}", path, to),
    }
    Ok(())
}

fn asset_parts(ctx: &AppContext) -> Result<(AssetCache, HttpAssetSource)> {
    let cache = AssetCache::new(&ctx.config.cache_dir()?);
    let source = HttpAssetSource::new(ctx.config.app_url.clone(), ctx.config.request_timeout())?;
    Ok((cache, source))
}

pub async fn assets_install(ctx: &AppContext) -> Result<()> {
    let (cache, source) = asset_parts(ctx)?;
    let count = cache.install(&source).await?;
    println!("Cached {} assets in {}", count, cache.dir().display());
    Ok(())
}

pub async fn assets_get(ctx: &AppContext, path: &str) -> Result<()> {
    let (cache, source) = asset_parts(ctx)?;
    let bytes = cache.respond(path, &source).await?;
    io::stdout().write_all(&bytes)?;
    Ok(())
}
