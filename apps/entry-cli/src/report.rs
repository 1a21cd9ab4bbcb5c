//! Plain-text output for the terminal.

use forecourt_client::{Notice, NoticeLevel, RefillReceipt, SubmissionReceipt};
use forecourt_core::history::HistoryLine;
use forecourt_core::{Employee, FormView, Money, Product, Volume};

pub fn print_employees(employees: &[Employee]) {
    if employees.is_empty() {
        println!("No active employees.");
        return;
    }
    for employee in employees {
        match &employee.employee_role {
            Some(role) => println!("{}  ({})", employee.display_name(), role),
            None => println!("{}", employee.display_name()),
        }
    }
}

pub fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No active products.");
        return;
    }
    println!("{:>4}  {:<20} {:>10}", "ID", "Product", "Price");
    for product in products {
        println!(
            "{:>4}  {:<20} {:>10}",
            product.product_id,
            product.product_name,
            product.unit_price()
        );
    }
}

pub fn print_reconciliation(view: &FormView) {
    println!("Entry date: {}", view.entry_date);
    println!(
        "{:<12} {:<4} {:>10} {:>10} {:>8} {:>10} {:>10} {:>12}",
        "Product", "Gun", "Opening", "Closing", "Testing", "Sold (L)", "Price", "Value"
    );
    for row in &view.rows {
        println!(
            "{:<12} {:<4} {:>10} {:>10} {:>8} {:>10} {:>10} {:>12}",
            row.product_name,
            row.gun,
            volume_cell(row.opening),
            volume_cell(row.closing),
            volume_cell(row.testing),
            row.sales_volume,
            row.price.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            row.sales_value,
        );
        if let Some(error) = &row.error {
            println!("  ! {}", error);
        }
    }

    let totals = &view.totals;
    println!();
    println!("Total sales:       {:>12}", totals.total_sales);
    println!("Total collection:  {:>12}", totals.total_collection);
    println!("Short collections: {:>12}", signed(totals.short_collections));
}

pub fn print_receipt(receipt: &SubmissionReceipt) {
    println!(
        "Submitted ({} strategy, {} request{}), key {}",
        receipt.strategy,
        receipt.requests,
        if receipt.requests == 1 { "" } else { "s" },
        receipt.idempotency_key
    );
}

pub fn print_history(lines: &[HistoryLine]) {
    if lines.is_empty() {
        println!("No recent entries.");
        return;
    }
    for line in lines {
        println!(
            "{:>6}  {:<19}  {:<12} {:<4} {:>10} {:>10}{}",
            line.entry_id.to_string(),
            line.date.as_deref().unwrap_or("-"),
            line.product_name,
            line.gun,
            number_cell(line.opening),
            number_cell(line.closing),
            if line.deletable { "  [latest]" } else { "" }
        );
    }
}

pub fn print_refill(receipt: &RefillReceipt) {
    println!(
        "Refilled product {} with {} {}; {} left to capacity",
        receipt.product_id, receipt.quantity, receipt.metric, receipt.refill_space
    );
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, notice.message);
    }
}

fn volume_cell(value: Option<Volume>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into())
}

fn signed(amount: Money) -> String {
    if amount.is_positive() {
        format!("+{}", amount)
    } else {
        amount.to_string()
    }
}
