// demos/storefront_cli/src/main.rs

mod config;

use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use cartsync::session::{Credential, Session, User};
use cartsync::{
  AddOutcome, CartReconciler, CheckoutError, FileStore, ProductId, SessionContext, SharedStorage, Storefront,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Cart and checkout against a storefront API")]
struct Cli {
  /// Overrides API_BASE_URL.
  #[arg(long, global = true)]
  api_url: Option<String>,

  /// Overrides CART_STORAGE_DIR.
  #[arg(long, global = true)]
  storage_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Add one unit of a product (no-op if already in the cart).
  Add { product_id: u64 },
  /// Fetch every product in the cart and print the lines and total.
  Show,
  /// Increase a line's quantity by one.
  Inc { product_id: u64 },
  /// Decrease a line's quantity by one (never below 1).
  Dec { product_id: u64 },
  /// Remove a line.
  Remove { product_id: u64 },
  /// Empty the cart.
  Clear,
  /// Submit the cart as an order.
  Checkout,
  /// List your orders.
  Orders {
    #[arg(long, default_value_t = 1)]
    page: u32,
  },
  /// Store a bearer token obtained elsewhere.
  Login {
    #[arg(long)]
    token: String,
    /// User record as JSON, e.g. '{"id":1,"name":"Ada","email":"ada@example.com"}'.
    #[arg(long)]
    user: Option<String>,
  },
  /// Forget the stored token.
  Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let app_config = AppConfig::from_env(cli.api_url.clone())?.with_storage_dir(cli.storage_dir.clone());

  let backend = FileStore::open(&app_config.storage_dir)
    .with_context(|| format!("Cannot open storage directory {}", app_config.storage_dir.display()))?;
  let storage = SharedStorage::new(backend);
  let handle = storage.attach();
  let session = SessionContext::restore(handle.clone());
  let storefront = Storefront::connect(&app_config.client, handle, session)?;

  run(cli.command, &storefront).await
}

async fn run(command: Command, storefront: &Storefront) -> Result<()> {
  match command {
    Command::Add { product_id } => match storefront.add_to_cart(ProductId(product_id))? {
      AddOutcome::Added => println!("Added product {product_id}. Cart has {} item(s).", storefront.badge_count()),
      AddOutcome::AlreadyInCart => println!("Product {product_id} is already in your cart."),
    },
    Command::Show => {
      let cart = open_reconciled(storefront).await;
      print_cart(&cart);
    }
    Command::Inc { product_id } => {
      let mut cart = open_reconciled(storefront).await;
      let quantity = cart.increase_quantity(ProductId(product_id))?;
      println!("Product {product_id}: quantity {quantity}.");
    }
    Command::Dec { product_id } => {
      let mut cart = open_reconciled(storefront).await;
      let quantity = cart.decrease_quantity(ProductId(product_id))?;
      println!("Product {product_id}: quantity {quantity}.");
    }
    Command::Remove { product_id } => {
      let mut cart = open_reconciled(storefront).await;
      cart.remove_item(ProductId(product_id))?;
      println!("Removed product {product_id}.");
    }
    Command::Clear => {
      storefront.open_cart().clear_cart()?;
      println!("Cart cleared.");
    }
    Command::Checkout => {
      let mut cart = open_reconciled(storefront).await;
      let checkout = storefront.checkout()?;
      match checkout.place_order(&mut cart).await {
        Ok(receipt) => {
          let message = receipt.message.as_deref().unwrap_or("Order placed successfully!");
          println!("{message}");
          if let Some(number) = receipt.order.and_then(|o| o.order_number) {
            println!("Order number: {number}");
          }
        }
        Err(e @ (CheckoutError::EmptyCart | CheckoutError::Unauthenticated)) => bail!("{e}"),
        Err(e) => return Err(e).context("Failed to place order. Please try again."),
      }
    }
    Command::Orders { page } => {
      let orders = storefront.my_orders(page).await?;
      if orders.data.is_empty() {
        println!("No orders on page {}.", orders.current_page);
      }
      for order in &orders.data {
        println!(
          "#{:<8} {:<12} {:>10} {} item(s)",
          order.order_number.clone().or(order.id.map(|id| id.to_string())).unwrap_or_default(),
          order.status.map(|s| format!("{s:?}").to_lowercase()).unwrap_or_default(),
          order.total.map(|t| format!("{t:.2}")).unwrap_or_default(),
          order.items.len()
        );
      }
      println!("Page {} of {}.", orders.current_page, orders.last_page.max(1));
    }
    Command::Login { token, user } => {
      let credential = Credential::new(token).context("Token must not be blank")?;
      let mut session = Session::new(credential);
      if let Some(raw) = user {
        let user: User = serde_json::from_str(&raw).context("Invalid --user JSON")?;
        session = session.with_user(user);
      }
      storefront.session().sign_in(session);
      println!("Signed in.");
    }
    Command::Logout => {
      if storefront.session().sign_out() {
        println!("Signed out.");
      } else {
        println!("Not signed in.");
      }
    }
  }
  Ok(())
}

async fn open_reconciled(storefront: &Storefront) -> CartReconciler {
  let mut cart = storefront.open_cart();
  let report = cart.reconcile().await;
  for failure in &report.failed {
    eprintln!("warning: product {} could not be loaded ({})", failure.product_id, failure.reason);
  }
  cart
}

fn print_cart(cart: &CartReconciler) {
  if cart.is_empty() && cart.unresolved().is_empty() {
    println!("Your cart is empty.");
    return;
  }
  for item in cart.items() {
    let price = item.unit_price().map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".to_string());
    println!(
      "{:>6}  {:<30} {:>3} x {:>8} = {:>9.2}",
      item.product_id().0,
      item.name(),
      item.quantity(),
      price,
      item.line_total()
    );
  }
  let unresolved = cart.unresolved();
  if !unresolved.is_empty() {
    println!("{} item(s) could not be loaded and are kept in your cart.", unresolved.len());
  }
  println!("Total: {:.2}", cart.total());
}
