//! Line-oriented staff console over the order board.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::application::order_board::{OrderBoard, Refresh};
use crate::application::progression::{ControlView, Outcome};
use crate::errors::AppError;
use quickbite_types::domain::bill::Bill;
use quickbite_types::domain::order::{Order, OrderStatus, Totals};
use quickbite_types::domain::stepper::{Density, Stepper};
use quickbite_types::ports::credentials::CredentialProvider;
use quickbite_types::ports::order_gateway::{OrderSource, OrderStatusUpdater};

pub const HELP: &str = "\
commands:
  list [status]     show orders, optionally only one status
  show <order>      show one order with its items
  advance <order>   move an order to its next status
  cancel <order>    ask to cancel an order (needs confirm)
  confirm <order>   confirm a pending cancellation
  decline <order>   keep the order
  refresh           fetch orders now
  bill              show the bill for this table session
  help              this text
  quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(Option<OrderStatus>),
    Show(String),
    Advance(String),
    Cancel(String),
    Confirm(String),
    Decline(String),
    Refresh,
    Bill,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

fn order_arg(verb: &str, arg: Option<&str>) -> Result<String, AppError> {
    arg.map(str::to_string)
        .ok_or_else(|| AppError::BadCommand(format!("{verb} needs an order number")))
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, AppError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if let Some(extra) = words.next() {
            return Err(AppError::BadCommand(format!("unexpected argument {extra:?}")));
        }
        let cmd = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List(arg.map(str::parse::<OrderStatus>).transpose()?),
            "show" => Command::Show(order_arg(verb, arg)?),
            "advance" | "next" => Command::Advance(order_arg(verb, arg)?),
            "cancel" => Command::Cancel(order_arg(verb, arg)?),
            "confirm" => Command::Confirm(order_arg(verb, arg)?),
            "decline" => Command::Decline(order_arg(verb, arg)?),
            "refresh" => Command::Refresh,
            "bill" => Command::Bill,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(AppError::BadCommand(format!("unknown command {other:?}"))),
        };
        Ok(Some(cmd))
    }
}

fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

fn totals_line(t: &Totals) -> String {
    format!(
        "subtotal {}  tax {}  service {}  total {}",
        money(t.subtotal_cents),
        money(t.tax_cents),
        money(t.service_fee_cents),
        money(t.total_cents)
    )
}

fn describe(outcome: &Outcome, order: &Order) -> String {
    let number = &order.order_number;
    match outcome {
        Outcome::Updated(status) => format!("#{number}: now {}", status.label()),
        Outcome::Failed(reason) => format!("#{number}: update failed ({reason})"),
        Outcome::AwaitingConfirmation => {
            format!("#{number}: cancel this order? `confirm {number}` or `decline {number}`")
        }
        Outcome::Declined => format!("#{number}: kept"),
        Outcome::Suppressed => format!("#{number}: an update is already in progress"),
        Outcome::Unavailable => format!(
            "#{number}: nothing to do while {}",
            order.status.label().to_lowercase()
        ),
    }
}

fn actions(view: Option<ControlView>) -> String {
    match view {
        None => String::new(),
        Some(ControlView::Cancelled) => "[order cancelled]".into(),
        Some(ControlView::Served) => "[served]".into(),
        Some(ControlView::Actions { busy: true, .. }) => "[updating…]".into(),
        Some(ControlView::Actions {
            confirming: true, ..
        }) => "[confirm cancellation?]".into(),
        Some(ControlView::Actions {
            next, can_cancel, ..
        }) => {
            let mut parts = Vec::new();
            if let Some(next) = next {
                parts.push(format!("[advance → {}]", next.label()));
            }
            if can_cancel {
                parts.push("[cancel]".to_string());
            }
            parts.join(" ")
        }
    }
}

pub struct Console<G>
where
    G: OrderSource + OrderStatusUpdater,
{
    board: Arc<OrderBoard<G>>,
    source: Arc<G>,
    credentials: Arc<dyn CredentialProvider>,
    density: Density,
}

impl<G> Console<G>
where
    G: OrderSource + OrderStatusUpdater,
{
    pub fn new(
        board: Arc<OrderBoard<G>>,
        source: Arc<G>,
        credentials: Arc<dyn CredentialProvider>,
        density: Density,
    ) -> Self {
        Self {
            board,
            source,
            credentials,
            density,
        }
    }

    /// Parses and runs one input line. Blank lines yield an empty reply.
    pub async fn handle_line(&self, line: &str) -> Result<Reply, AppError> {
        match Command::parse(line)? {
            Some(cmd) => self.execute(cmd).await,
            None => Ok(Reply::Text(String::new())),
        }
    }

    pub async fn execute(&self, cmd: Command) -> Result<Reply, AppError> {
        let text = match cmd {
            Command::List(filter) => self.render_list(filter),
            Command::Show(reference) => {
                let order = self.lookup(&reference)?;
                self.render_order(&order, true)
            }
            Command::Advance(reference) => {
                let order = self.lookup(&reference)?;
                let outcome = self.board.advance(&order.id).await?;
                describe(&outcome, &order)
            }
            Command::Cancel(reference) => {
                let order = self.lookup(&reference)?;
                describe(&self.board.request_cancel(&order.id)?, &order)
            }
            Command::Confirm(reference) => {
                let order = self.lookup(&reference)?;
                let outcome = self.board.confirm_cancel(&order.id).await?;
                describe(&outcome, &order)
            }
            Command::Decline(reference) => {
                let order = self.lookup(&reference)?;
                describe(&self.board.decline_cancel(&order.id)?, &order)
            }
            Command::Refresh => {
                let count = self.board.refresh(Refresh::Requested).await?;
                format!("{count} orders")
            }
            Command::Bill => {
                let session = self.credentials.session_id().ok_or_else(|| {
                    AppError::BadCommand("no table session configured (SESSION_ID)".into())
                })?;
                let bill = self.source.get_bill(&session).await?;
                self.render_bill(&bill)
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }

    fn lookup(&self, reference: &str) -> Result<Order, AppError> {
        self.board
            .find(reference)
            .ok_or_else(|| AppError::UnknownOrder(reference.to_string()))
    }

    fn render_list(&self, filter: Option<OrderStatus>) -> String {
        let orders: Vec<Order> = self
            .board
            .orders()
            .into_iter()
            .filter(|o| filter.map_or(true, |s| o.status == s))
            .collect();
        if orders.is_empty() {
            return "no orders".to_string();
        }
        orders
            .iter()
            .map(|o| self.render_order(o, false))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn render_order(&self, order: &Order, with_items: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "#{}  table {}  {}  {} item(s)  {}  placed {}",
            order.order_number,
            order.table_number,
            order.status.label(),
            order.item_count(),
            money(order.totals.total_cents),
            order.created_at.format("%H:%M"),
        );
        let _ = write!(out, "  {}", Stepper::new(order.status, self.density));
        if with_items {
            for item in &order.items {
                let _ = write!(
                    out,
                    "\n    {} x {}  {}",
                    item.quantity,
                    item.name,
                    money(item.subtotal_cents())
                );
            }
            let _ = write!(out, "\n    {}", totals_line(&order.totals));
        }
        let actions = actions(self.board.control(&order.id).map(|c| c.view()));
        if !actions.is_empty() {
            let _ = write!(out, "\n  {actions}");
        }
        out
    }

    pub fn render_bill(&self, bill: &Bill) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Bill for table {}", bill.table_number);
        for order in &bill.orders {
            let _ = writeln!(
                out,
                "  #{}  {}",
                order.order_number,
                Stepper::new(order.status, self.density)
            );
            for item in &order.items {
                let _ = writeln!(
                    out,
                    "    {} x {}  {}",
                    item.quantity,
                    item.name,
                    money(item.subtotal_cents())
                );
            }
            let _ = writeln!(out, "    {}", totals_line(&order.totals));
        }
        let s = &bill.summary;
        let _ = writeln!(out, "  subtotal      {}", money(s.subtotal_cents));
        let _ = writeln!(out, "  tax ({})  {}", s.tax_rate, money(s.tax_cents));
        let _ = writeln!(
            out,
            "  service ({})  {}",
            s.service_fee_rate,
            money(s.service_fee_cents)
        );
        let _ = write!(out, "  grand total   {}", money(s.grand_total_cents));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::memory::InMemoryOrders;
    use crate::outbound::notifier::TracingNotifier;
    use quickbite_types::domain::order::{OrderItem, Rates};
    use quickbite_types::domain::status::StatusError;
    use quickbite_types::ports::credentials::StaticCredentials;

    const RATES: Rates = Rates {
        tax_bps: 1_000,
        service_fee_bps: 500,
    };

    fn order(id: &str, number: &str, status: OrderStatus) -> Order {
        let mut o = Order::new(
            id,
            number,
            12,
            vec![OrderItem {
                name: "Pho".into(),
                quantity: 2,
                unit_price_cents: 1_100,
            }],
            RATES,
        )
        .unwrap();
        o.status = status;
        o
    }

    async fn setup(session: Option<&str>) -> (Console<InMemoryOrders>, InMemoryOrders) {
        let repo = InMemoryOrders::new(RATES);
        repo.insert_for_session("table-12", order("a", "A001", OrderStatus::Preparing));
        repo.insert_for_session("table-12", order("b", "A002", OrderStatus::Cancelled));
        let gateway = Arc::new(repo.clone());
        let board = Arc::new(OrderBoard::new(gateway.clone(), Arc::new(TracingNotifier)));
        board.refresh(Refresh::Scheduled).await.unwrap();
        let creds = Arc::new(StaticCredentials::new(session.map(str::to_string), None));
        (
            Console::new(board, gateway, creds, Density::Full),
            repo,
        )
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(t) => t,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(
            Command::parse("advance A001").unwrap(),
            Some(Command::Advance("A001".into()))
        );
        assert_eq!(
            Command::parse("LIST ready").unwrap(),
            Some(Command::List(Some(OrderStatus::Ready)))
        );
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
        assert!(matches!(
            Command::parse("cancel"),
            Err(AppError::BadCommand(_))
        ));
        assert!(matches!(
            Command::parse("dance"),
            Err(AppError::BadCommand(_))
        ));
        assert!(matches!(
            Command::parse("show A1 A2"),
            Err(AppError::BadCommand(_))
        ));
    }

    #[test]
    fn bad_status_filter_is_invalid_status() {
        let err = Command::parse("list delivered").unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStatus(StatusError::InvalidStatus(ref s)) if s == "delivered"
        ));
    }

    #[tokio::test]
    async fn list_renders_stepper_and_actions() {
        let (console, _) = setup(None).await;
        let out = text(console.handle_line("list preparing").await.unwrap());
        assert!(out.contains("#A001"));
        assert!(!out.contains("#A002"));
        assert!(out.contains("✓ Pending ─ ✓ Confirmed ─ ● Preparing ─ ○ Ready ─ ○ Served"));
        assert!(out.contains("[advance → Ready] [cancel]"));

        let out = text(console.handle_line("show A002").await.unwrap());
        assert!(out.contains("● Preparing ─ ✕ Cancelled"));
        assert!(out.contains("[order cancelled]"));
        assert!(out.contains("2 x Pho  22.00"));
    }

    #[tokio::test]
    async fn cancel_then_confirm() {
        let (console, repo) = setup(None).await;
        let out = text(console.handle_line("cancel A001").await.unwrap());
        assert!(out.contains("confirm A001"));
        assert_eq!(repo.status_of("a"), Some(OrderStatus::Preparing));

        let out = text(console.handle_line("confirm #A001").await.unwrap());
        assert_eq!(out, "#A001: now Cancelled");
        assert_eq!(repo.status_of("a"), Some(OrderStatus::Cancelled));
    }

    #[tokio::test]
    async fn advance_on_cancelled_order_does_nothing() {
        let (console, repo) = setup(None).await;
        let out = text(console.handle_line("advance A002").await.unwrap());
        assert!(out.contains("nothing to do"));
        assert_eq!(repo.update_calls(), 0);
    }

    #[tokio::test]
    async fn bill_needs_a_session() {
        let (console, _) = setup(None).await;
        assert!(matches!(
            console.handle_line("bill").await,
            Err(AppError::BadCommand(_))
        ));

        let (console, _) = setup(Some("table-12")).await;
        let out = text(console.handle_line("bill").await.unwrap());
        assert!(out.starts_with("Bill for table 12"));
        // Only the live order counts: 22.00 + 2.20 tax + 1.10 service.
        assert!(out.contains("grand total   25.30"));
        assert!(out.contains("tax (10%)"));
        // Each order carries its own breakdown, cancelled ones included.
        assert_eq!(
            out.matches("    subtotal 22.00  tax 2.20  service 1.10  total 25.30")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn unknown_order_and_quit() {
        let (console, _) = setup(None).await;
        assert!(matches!(
            console.handle_line("show Z9").await,
            Err(AppError::UnknownOrder(_))
        ));
        assert_eq!(console.handle_line("exit").await.unwrap(), Reply::Quit);
    }
}
