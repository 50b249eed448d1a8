//! # Register Commands
//!
//! Parses one input line into a [`Command`].
//!
//! ## Grammar
//! ```text
//! <barcode>                         bare line: scan, or the quantity when one is pending
//! scan <barcode>
//! qty <n>                           confirm the pending scan
//! set <line> <qty>                  line = barcode or #index (1-based)
//! inc <line> | dec <line>          also `+ <line>` and `- <line>`
//! rm <line>
//! cart | checkout | cancel | clear
//! products [text] [--category <id>] [--low]
//! product add <barcode> <price> <stock> <category> <name...>
//! product edit <barcode> [name=...] [price=...] [stock=...] [category=...]
//! product delete <barcode>
//! sales [day|week|month|all] [text] [--json]
//! help | quit
//! ```

use kiosk_core::catalog::ProductFilter;
use kiosk_core::history::SalesPeriod;
use kiosk_core::validation::ProductForm;
use kiosk_core::Category;

use crate::error::{TerminalError, TerminalResult};

/// A cart line addressed by barcode or by its position in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
    Barcode(String),
    /// 1-based, as listed by `cart`
    Index(usize),
}

impl LineRef {
    fn parse(token: &str) -> TerminalResult<Self> {
        match token.strip_prefix('#') {
            Some(n) => n
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(LineRef::Index)
                .ok_or_else(|| TerminalError::validation(format!("Invalid line number '{}'", token))),
            None => Ok(LineRef::Barcode(token.to_string())),
        }
    }
}

/// Field changes for `product edit`. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductEdits {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub category: Option<String>,
}

impl ProductEdits {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none() && self.category.is_none()
    }

    /// Applies the edits over a form built from the stored product.
    pub fn apply_to(&self, form: &mut ProductForm) {
        if let Some(name) = &self.name {
            form.name = name.clone();
        }
        if let Some(price) = &self.price {
            form.price = price.clone();
        }
        if let Some(stock) = &self.stock {
            form.stock = stock.clone();
        }
        if let Some(category) = &self.category {
            form.category = category.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A line with no keyword, typically from the scanner.
    Bare(String),
    Scan(String),
    Quantity(String),
    SetQuantity { line: LineRef, quantity: String },
    /// One unit more (`+1`) or less (`-1`) on a line.
    Step { line: LineRef, delta: i64 },
    Remove(LineRef),
    ShowCart,
    Checkout,
    Cancel,
    ClearCart,
    Products { filter: ProductFilter, low_only: bool },
    AddProduct(ProductForm),
    EditProduct { barcode: String, edits: ProductEdits },
    DeleteProduct(String),
    Sales { period: SalesPeriod, search: String, json: bool },
    Help,
    Quit,
}

/// Parses an input line. Blank lines yield `None`.
pub fn parse(line: &str) -> TerminalResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match keyword.to_lowercase().as_str() {
        "scan" | "s" => Command::Scan(required(&args, 0, "scan <barcode>")?.to_string()),
        "qty" | "q" => Command::Quantity(rest.to_string()),
        "set" => {
            let line = LineRef::parse(required(&args, 0, "set <line> <qty>")?)?;
            // Quantity text is passed through as typed; the input policy decides
            Command::SetQuantity {
                line,
                quantity: args[1..].join(" "),
            }
        }
        "inc" | "+" => Command::Step {
            line: LineRef::parse(required(&args, 0, "inc <line>")?)?,
            delta: 1,
        },
        "dec" | "-" => Command::Step {
            line: LineRef::parse(required(&args, 0, "dec <line>")?)?,
            delta: -1,
        },
        "rm" | "remove" => Command::Remove(LineRef::parse(required(&args, 0, "rm <line>")?)?),
        "cart" | "c" => Command::ShowCart,
        "checkout" | "pay" => Command::Checkout,
        "cancel" => Command::Cancel,
        "clear" => Command::ClearCart,
        "products" | "p" => parse_products(&args)?,
        "product" => parse_product(&args)?,
        "sales" => parse_sales(&args)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ if args.is_empty() => Command::Bare(line.to_string()),
        _ => {
            return Err(TerminalError::unknown_command(format!(
                "Unknown command '{}'. Type 'help' for the list of commands",
                keyword
            )))
        }
    };

    Ok(Some(command))
}

fn required<'a>(args: &[&'a str], index: usize, usage: &str) -> TerminalResult<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| TerminalError::validation(format!("Usage: {}", usage)))
}

fn parse_products(args: &[&str]) -> TerminalResult<Command> {
    let mut search = Vec::new();
    let mut category = None;
    let mut low_only = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--category" | "-c" => {
                let id = iter
                    .next()
                    .ok_or_else(|| TerminalError::validation("Usage: products --category <id>"))?;
                category = Some(id.parse::<Category>()?);
            }
            "--low" => low_only = true,
            word => search.push(word),
        }
    }

    Ok(Command::Products {
        filter: ProductFilter::new(search.join(" "), category),
        low_only,
    })
}

fn parse_product(args: &[&str]) -> TerminalResult<Command> {
    const USAGE: &str = "product add|edit|delete ...";

    match required(args, 0, USAGE)? {
        "add" => {
            const ADD: &str = "product add <barcode> <price> <stock> <category> <name...>";
            let form = ProductForm {
                barcode: required(args, 1, ADD)?.to_string(),
                price: required(args, 2, ADD)?.to_string(),
                stock: required(args, 3, ADD)?.to_string(),
                category: required(args, 4, ADD)?.to_string(),
                name: args.get(5..).map(|words| words.join(" ")).unwrap_or_default(),
            };
            Ok(Command::AddProduct(form))
        }
        "edit" => {
            const EDIT: &str = "product edit <barcode> [name=...] [price=...] [stock=...] [category=...]";
            let barcode = required(args, 1, EDIT)?.to_string();
            let edits = parse_edits(&args[2..])?;
            if edits.is_empty() {
                return Err(TerminalError::validation(format!("Usage: {}", EDIT)));
            }
            Ok(Command::EditProduct { barcode, edits })
        }
        "delete" | "rm" => Ok(Command::DeleteProduct(
            required(args, 1, "product delete <barcode>")?.to_string(),
        )),
        other => Err(TerminalError::unknown_command(format!(
            "Unknown product action '{}'. Usage: {}",
            other, USAGE
        ))),
    }
}

/// `name=Agua 1L price=15` : a value runs until the next `key=`.
fn parse_edits(args: &[&str]) -> TerminalResult<ProductEdits> {
    let mut edits = ProductEdits::default();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) => {
                if let Some((key, words)) = current.take() {
                    set_field(&mut edits, key, &words)?;
                }
                let words = if value.is_empty() { Vec::new() } else { vec![value] };
                current = Some((key, words));
            }
            None => match current.as_mut() {
                Some((_, words)) => words.push(*arg),
                None => {
                    return Err(TerminalError::validation(format!(
                        "Expected field=value, got '{}'",
                        arg
                    )))
                }
            },
        }
    }
    if let Some((key, words)) = current {
        set_field(&mut edits, key, &words)?;
    }

    Ok(edits)
}

fn set_field(edits: &mut ProductEdits, key: &str, words: &[&str]) -> TerminalResult<()> {
    let value = Some(words.join(" "));
    match key {
        "name" => edits.name = value,
        "price" => edits.price = value,
        "stock" => edits.stock = value,
        "category" => edits.category = value,
        other => {
            return Err(TerminalError::validation(format!(
                "Unknown field '{}' (name, price, stock, category)",
                other
            )))
        }
    }
    Ok(())
}

fn parse_sales(args: &[&str]) -> TerminalResult<Command> {
    let mut period = SalesPeriod::Today;
    let mut search = Vec::new();
    let mut json = false;

    for (i, arg) in args.iter().enumerate() {
        match *arg {
            "--json" => json = true,
            word if i == 0 => match word.parse::<SalesPeriod>() {
                Ok(p) => period = p,
                Err(_) => search.push(word),
            },
            word => search.push(word),
        }
    }

    Ok(Command::Sales {
        period,
        search: search.join(" "),
        json,
    })
}

/// Help text for the `help` command.
pub const HELP: &str = "\
Scanning
  <barcode>                 scan (or type the quantity when asked)
  scan <barcode>            scan explicitly
  qty <n>                   confirm the quantity of the scanned product
  cancel                    drop the pending scan
Cart
  cart                      show the cart
  set <line> <qty>          change a quantity (line = barcode or #n)
  inc <line>, dec <line>    one unit more or less (also + and -)
  rm <line>                 remove a line
  clear                     empty the cart
  checkout                  settle the cart as a sale
Catalog
  products [text] [--category <id>] [--low]
  product add <barcode> <price> <stock> <category> <name...>
  product edit <barcode> [name=...] [price=...] [stock=...] [category=...]
  product delete <barcode>
History
  sales [day|week|month|all] [text] [--json]
Other
  help, quit";

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_bare_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parsed("7790001"), Command::Bare("7790001".to_string()));
        assert_eq!(parsed("scan 7790001"), Command::Scan("7790001".to_string()));
        assert!(parse("frobnicate now").is_err());
    }

    #[test]
    fn test_cart_commands() {
        assert_eq!(
            parsed("set #2 5"),
            Command::SetQuantity {
                line: LineRef::Index(2),
                quantity: "5".to_string()
            }
        );
        assert_eq!(
            parsed("set 7790001"),
            Command::SetQuantity {
                line: LineRef::Barcode("7790001".to_string()),
                quantity: String::new()
            }
        );
        assert_eq!(
            parsed("+ #1"),
            Command::Step {
                line: LineRef::Index(1),
                delta: 1
            }
        );
        assert_eq!(
            parsed("dec 7790001"),
            Command::Step {
                line: LineRef::Barcode("7790001".to_string()),
                delta: -1
            }
        );
        assert!(parse("inc").is_err());
        assert_eq!(parsed("rm #1"), Command::Remove(LineRef::Index(1)));
        assert!(parse("rm #0").is_err());
        assert_eq!(parsed("qty 3"), Command::Quantity("3".to_string()));
        assert_eq!(parsed("PAY"), Command::Checkout);
    }

    #[test]
    fn test_products_filter() {
        match parsed("products agua mineral --category beverages --low") {
            Command::Products { filter, low_only } => {
                assert_eq!(filter.search, "agua mineral");
                assert_eq!(filter.category, Some(Category::Beverages));
                assert!(low_only);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("products --category weapons").is_err());
    }

    #[test]
    fn test_product_add_and_edit() {
        match parsed("product add 7790001 10.50 24 beverages Agua 500ml") {
            Command::AddProduct(form) => {
                assert_eq!(form.barcode, "7790001");
                assert_eq!(form.price, "10.50");
                assert_eq!(form.stock, "24");
                assert_eq!(form.category, "beverages");
                assert_eq!(form.name, "Agua 500ml");
            }
            other => panic!("unexpected {other:?}"),
        }

        match parsed("product edit 7790001 name=Agua con gas price=12") {
            Command::EditProduct { barcode, edits } => {
                assert_eq!(barcode, "7790001");
                assert_eq!(edits.name.as_deref(), Some("Agua con gas"));
                assert_eq!(edits.price.as_deref(), Some("12"));
                assert_eq!(edits.stock, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(parse("product edit 7790001").is_err());
        assert!(parse("product edit 7790001 colour=red").is_err());
        assert!(parse("product add 7790001 10").is_err());
    }

    #[test]
    fn test_sales_arguments() {
        assert_eq!(
            parsed("sales"),
            Command::Sales {
                period: SalesPeriod::Today,
                search: String::new(),
                json: false
            }
        );
        assert_eq!(
            parsed("sales week agua --json"),
            Command::Sales {
                period: SalesPeriod::LastWeek,
                search: "agua".to_string(),
                json: true
            }
        );
        assert_eq!(
            parsed("sales 40.00"),
            Command::Sales {
                period: SalesPeriod::Today,
                search: "40.00".to_string(),
                json: false
            }
        );
    }
}
