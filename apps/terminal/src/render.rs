//! Text rendering of register refreshes.

use chrono::Local;
use serde::Serialize;

use kiosk_core::history::{SalesPeriod, SalesSummary, SALE_DATE_FORMAT};
use kiosk_core::{Product, Sale};

use crate::commands::HELP;
use crate::config::TerminalConfig;
use crate::register::{CartView, Refresh};

pub struct Renderer<'a> {
    config: &'a TerminalConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a TerminalConfig) -> Self {
        Renderer { config }
    }

    pub fn banner(&self, cashier: &str) -> String {
        format!(
            "{} | {} | type 'help' for commands, scan to start",
            self.config.store_name, cashier
        )
    }

    pub fn render(&self, refresh: &Refresh) -> String {
        match refresh {
            Refresh::Cart(view) => self.cart(view),
            Refresh::AwaitingQuantity {
                product,
                in_cart,
                max_addable,
            } => {
                let mut out = format!(
                    "{} {} ({} in stock",
                    product.name,
                    self.money(product.price_cents),
                    product.stock
                );
                if *in_cart > 0 {
                    out.push_str(&format!(", {} already in cart", in_cart));
                }
                out.push_str(&format!(")\nQuantity (1-{})?", max_addable));
                out
            }
            Refresh::SaleCompleted(sale) => self.receipt(sale),
            Refresh::Products {
                products,
                low_stock_threshold,
            } => self.products(products, *low_stock_threshold),
            Refresh::ProductSaved(p) => format!(
                "✓ Saved {} {} {} stock {} [{}]",
                p.barcode,
                p.name,
                self.money(p.price_cents),
                p.stock,
                p.category.id()
            ),
            Refresh::ProductDeleted { barcode, name } => format!("✓ Deleted {} {}", barcode, name),
            Refresh::Sales {
                period,
                sales,
                summary,
                json,
            } => {
                if *json {
                    sales_json(*period, sales, summary)
                } else {
                    self.sales(*period, sales, summary)
                }
            }
            Refresh::Help => HELP.to_string(),
            Refresh::Quit => "Bye".to_string(),
        }
    }

    fn money(&self, cents: i64) -> String {
        self.config.format_currency(cents)
    }

    fn cart(&self, view: &CartView) -> String {
        if view.lines.is_empty() {
            return "Cart is empty".to_string();
        }

        let mut out = String::new();
        for (i, line) in view.lines.iter().enumerate() {
            out.push_str(&format!(
                "#{:<3} {:<14} {:<28} {:>4} x {:>10} = {:>10}\n",
                i + 1,
                line.barcode,
                truncate(&line.name, 28),
                line.quantity,
                self.money(line.price_cents),
                self.money(line.subtotal().cents())
            ));
        }
        out.push_str(&format!(
            "{} line(s), {} unit(s)  TOTAL {}",
            view.totals.line_count,
            view.totals.total_quantity,
            self.money(view.totals.total.cents())
        ));
        out
    }

    fn receipt(&self, sale: &Sale) -> String {
        let mut out = format!(
            "✓ Sale {} recorded {}\n",
            sale.id,
            sale.date.with_timezone(&Local).format("%d/%m/%y %H:%M")
        );
        for item in &sale.items {
            out.push_str(&format!(
                "  {:>4} x {:<28} {:>10}\n",
                item.quantity,
                truncate(&item.name, 28),
                self.money(item.subtotal_cents)
            ));
        }
        out.push_str(&format!("  TOTAL {}", self.money(sale.total_cents)));
        out
    }

    fn products(&self, products: &[Product], threshold: i64) -> String {
        if products.is_empty() {
            return "No products found".to_string();
        }

        let mut out = String::new();
        for p in products {
            let flag = if p.stock <= 0 {
                "  OUT"
            } else if p.is_low_stock(threshold) {
                "  LOW"
            } else {
                ""
            };
            out.push_str(&format!(
                "{:<14} {:<28} {:>10} {:>5}  {:<14}{}\n",
                p.barcode,
                truncate(&p.name, 28),
                self.money(p.price_cents),
                p.stock,
                p.category.id(),
                flag
            ));
        }
        out.push_str(&format!("{} product(s)", products.len()));
        out
    }

    fn sales(&self, period: SalesPeriod, sales: &[Sale], summary: &SalesSummary) -> String {
        if sales.is_empty() {
            return format!("No sales ({})", period);
        }

        let mut out = String::new();
        for sale in sales {
            let names: Vec<&str> = sale.items.iter().map(|i| i.name.as_str()).collect();
            out.push_str(&format!(
                "{}  {:>10}  {:>3} unit(s)  {}\n",
                sale.date.with_timezone(&Local).format(SALE_DATE_FORMAT),
                self.money(sale.total_cents),
                sale.total_quantity(),
                truncate(&names.join(", "), 48)
            ));
        }
        out.push_str(&format!(
            "{} sale(s), {} unit(s), {} ({})",
            summary.count,
            summary.units,
            self.money(summary.total.cents()),
            period
        ));
        out
    }
}

#[derive(Serialize)]
struct SalesReport<'a> {
    period: SalesPeriod,
    summary: &'a SalesSummary,
    sales: &'a [Sale],
}

fn sales_json(period: SalesPeriod, sales: &[Sale], summary: &SalesSummary) -> String {
    let report = SalesReport {
        period,
        summary,
        sales,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
