//! Storefront navigation header, computed from an explicitly passed session
//! context instead of ambient providers.

use serde::Serialize;

/// Signed-in storefront user as far as the header is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
}

/// What the header needs from the session and cart.
pub trait SessionContext {
    fn current_user(&self) -> Option<&SessionUser>;
    fn cart_item_count(&self) -> u32;
    fn logout(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const fn link(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href }
}

const MAX_BADGE: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderModel {
    pub links: Vec<NavLink>,
    pub greeting: Option<String>,
    /// Cart badge text; absent when the cart is empty
    pub cart_badge: Option<String>,
}

impl HeaderModel {
    pub fn from_context<C: SessionContext + ?Sized>(ctx: &C) -> Self {
        let mut links = vec![
            link("Home", "/"),
            link("Products", "/products"),
            link("Cart", "/cart"),
        ];

        let greeting = match ctx.current_user() {
            Some(user) => {
                if user.is_admin {
                    links.push(link("Admin", "/admin"));
                }
                links.push(link("Logout", "/logout"));
                Some(format!("Hi, {}", user.username))
            }
            None => {
                links.push(link("Login", "/login"));
                links.push(link("Sign Up", "/signup"));
                None
            }
        };

        let cart_badge = match ctx.cart_item_count() {
            0 => None,
            n if n > MAX_BADGE => Some(format!("{}+", MAX_BADGE)),
            n => Some(n.to_string()),
        };

        Self {
            links,
            greeting,
            cart_badge,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.links.iter().map(|l| l.label).collect()
    }
}
