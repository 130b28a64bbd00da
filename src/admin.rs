//! Admin dashboard shell: tab selection plus read-only projections over the
//! users and orders it was given.

use rust_decimal::Decimal;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tracing::{info, warn};

use crate::controller::ReportController;
use crate::models::{Order, OrderStatus, User};
use crate::transport::{AdminDirectory, ReportTransport};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Overview,
    Users,
    Orders,
    Reports,
}

/// Headline numbers of the overview tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewMetrics {
    pub total_users: usize,
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub pending_orders: usize,
    pub completed_orders: usize,
}

impl OverviewMetrics {
    pub fn compute(users: &[User], orders: &[Order]) -> Self {
        Self {
            total_users: users.len(),
            total_orders: orders.len(),
            total_revenue: orders.iter().map(|o| o.total_amount).sum(),
            pending_orders: orders.iter().filter(|o| o.status.is_pending()).count(),
            completed_orders: orders.iter().filter(|o| o.status.is_completed()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: &'static str,
    pub joined: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: if user.is_admin { "Admin" } else { "Customer" },
            joined: user.created_at.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub total: String,
    pub status: OrderStatus,
    pub placed: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: format!("${:.2}", order.total_amount),
            status: order.status,
            placed: order.created_at.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Tabbed admin container. Users and orders are never modified here.
pub struct AdminShell<T: ?Sized> {
    users: Vec<User>,
    orders: Vec<Order>,
    active_tab: AdminTab,
    reports: ReportController<T>,
    reports_mounted: bool,
    users_error: Option<String>,
    orders_error: Option<String>,
}

impl<T> AdminShell<T>
where
    T: ReportTransport + ?Sized,
{
    pub fn new(users: Vec<User>, orders: Vec<Order>, reports: ReportController<T>) -> Self {
        Self {
            users,
            orders,
            active_tab: AdminTab::default(),
            reports,
            reports_mounted: false,
            users_error: None,
            orders_error: None,
        }
    }

    /// Fetches users and orders through `directory`. A failed fetch leaves
    /// that collection empty and keeps its message; the other collection is
    /// unaffected.
    pub async fn load<D>(directory: &D, reports: ReportController<T>) -> Self
    where
        D: AdminDirectory + ?Sized,
    {
        let (users, orders) = tokio::join!(directory.fetch_users(), directory.fetch_orders());

        let (users, users_error) = if users.success {
            (users.data.unwrap_or_default(), None)
        } else {
            warn!("Users unavailable: {}", users.message);
            (Vec::new(), Some(users.message))
        };
        let (orders, orders_error) = if orders.success {
            (orders.data.unwrap_or_default(), None)
        } else {
            warn!("Orders unavailable: {}", orders.message);
            (Vec::new(), Some(orders.message))
        };

        info!(users = users.len(), orders = orders.len(), "Admin shell loaded");
        let mut shell = Self::new(users, orders, reports);
        shell.users_error = users_error;
        shell.orders_error = orders_error;
        shell
    }

    pub fn active_tab(&self) -> AdminTab {
        self.active_tab
    }

    /// Switches tabs. Entering the reports tab for the first time loads the
    /// first page of reports.
    pub async fn select_tab(&mut self, tab: AdminTab) {
        self.active_tab = tab;
        if tab == AdminTab::Reports && !self.reports_mounted {
            self.reports_mounted = true;
            self.reports.load_reports().await;
        }
    }

    pub fn overview(&self) -> OverviewMetrics {
        OverviewMetrics::compute(&self.users, &self.orders)
    }

    pub fn user_rows(&self) -> Vec<UserRow> {
        self.users.iter().map(UserRow::from).collect()
    }

    pub fn order_rows(&self) -> Vec<OrderRow> {
        self.orders.iter().map(OrderRow::from).collect()
    }

    pub fn reports(&self) -> &ReportController<T> {
        &self.reports
    }

    /// Message of the failed users fetch, if it failed.
    pub fn users_error(&self) -> Option<&str> {
        self.users_error.as_deref()
    }

    pub fn orders_error(&self) -> Option<&str> {
        self.orders_error.as_deref()
    }

    /// Every load failure, users first.
    pub fn load_errors(&self) -> Vec<String> {
        self.users_error
            .iter()
            .chain(self.orders_error.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperationResult, Pagination, ReportListing};
    use crate::transport::{MockAdminDirectory, MockReportTransport};
    use std::str::FromStr;
    use std::sync::Arc;
    use strum::IntoEnumIterator;

    fn user(id: i64, admin: bool) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            is_admin: admin,
            created_at: None,
        }
    }

    fn order(id: i64, total: &str, status: OrderStatus) -> Order {
        Order {
            id,
            user_id: 1,
            total_amount: Decimal::from_str(total).unwrap(),
            status,
            created_at: Some("2024-05-01T10:00:00".into()),
        }
    }

    fn idle_reports() -> ReportController<MockReportTransport> {
        ReportController::new(Arc::new(MockReportTransport::new()), 10)
    }

    #[test]
    fn overview_aggregates_orders() {
        let orders = vec![
            order(1, "19.99", OrderStatus::Pending),
            order(2, "5.01", OrderStatus::Delivered),
            order(3, "100.00", OrderStatus::Delivered),
            order(4, "7.50", OrderStatus::Shipped),
        ];
        let metrics = OverviewMetrics::compute(&[user(1, false)], &orders);

        assert_eq!(metrics.total_users, 1);
        assert_eq!(metrics.total_orders, 4);
        assert_eq!(metrics.total_revenue, Decimal::from_str("132.50").unwrap());
        assert_eq!(metrics.pending_orders, 1);
        assert_eq!(metrics.completed_orders, 2);
    }

    #[test]
    fn empty_dashboard_has_zero_revenue() {
        let metrics = OverviewMetrics::compute(&[], &[]);
        assert_eq!(metrics.total_revenue, Decimal::ZERO);
        assert_eq!(metrics.pending_orders, 0);
    }

    #[test]
    fn rows_project_in_input_order() {
        let shell = AdminShell::new(
            vec![user(2, true), user(1, false)],
            vec![order(9, "12.5", OrderStatus::Pending)],
            idle_reports(),
        );

        let users = shell.user_rows();
        assert_eq!(users[0].id, 2);
        assert_eq!(users[0].role, "Admin");
        assert_eq!(users[1].role, "Customer");
        assert_eq!(users[1].joined, "-");

        let orders = shell.order_rows();
        assert_eq!(orders[0].total, "$12.50");
        assert_eq!(orders[0].status.to_string(), "pending");
    }

    #[test]
    fn tabs_parse_and_iterate() {
        let tabs: Vec<String> = AdminTab::iter().map(|t| t.to_string()).collect();
        assert_eq!(tabs, vec!["overview", "users", "orders", "reports"]);
        assert_eq!(AdminTab::from_str("reports").unwrap(), AdminTab::Reports);
    }

    #[tokio::test]
    async fn reports_tab_loads_once() {
        let mut transport = MockReportTransport::new();
        transport.expect_get_all_reports().times(1).returning(|_| {
            OperationResult::success(
                ReportListing {
                    reports: vec![],
                    pagination: Some(Pagination {
                        total: 0,
                        pages: 0,
                        current_page: 1,
                    }),
                },
                "Reports loaded",
            )
        });
        let mut shell = AdminShell::new(
            vec![],
            vec![],
            ReportController::new(Arc::new(transport), 10),
        );

        shell.select_tab(AdminTab::Reports).await;
        shell.select_tab(AdminTab::Users).await;
        shell.select_tab(AdminTab::Reports).await;

        assert_eq!(shell.active_tab(), AdminTab::Reports);
        assert!(shell.reports().snapshot().await.pagination.is_some());
    }

    #[tokio::test]
    async fn load_tolerates_partial_failure() {
        let mut directory = MockAdminDirectory::new();
        directory
            .expect_fetch_users()
            .returning(|| OperationResult::success(vec![user(1, true)], "Loaded 1 users"));
        directory.expect_fetch_orders().returning(|| {
            OperationResult::failure("Failed to fetch orders", Some("HTTP 500".into()))
        });

        let shell = AdminShell::load(&directory, idle_reports()).await;
        assert_eq!(shell.user_rows().len(), 1);
        assert!(shell.order_rows().is_empty());
        assert_eq!(shell.load_errors(), vec!["Failed to fetch orders".to_string()]);
        assert!(shell.users_error().is_none());
        assert_eq!(shell.orders_error(), Some("Failed to fetch orders"));
        assert_eq!(shell.overview().total_revenue, Decimal::ZERO);
    }

    #[tokio::test]
    async fn failed_users_fetch_keeps_orders() {
        let mut directory = MockAdminDirectory::new();
        directory.expect_fetch_users().returning(|| {
            OperationResult::failure("Failed to fetch users", Some("HTTP 403".into()))
        });
        directory.expect_fetch_orders().returning(|| {
            OperationResult::success(
                vec![order(3, "40.00", OrderStatus::Delivered)],
                "Loaded 1 orders",
            )
        });

        let shell = AdminShell::load(&directory, idle_reports()).await;
        assert_eq!(shell.users_error(), Some("Failed to fetch users"));
        assert!(shell.orders_error().is_none());
        assert_eq!(shell.order_rows().len(), 1);
        assert_eq!(shell.overview().completed_orders, 1);
    }
}
