//! HTML rendering of a [`PageView`].

use tera::{Context, Tera};

use crate::session::PageView;

const PAGE_TEMPLATE: &str = include_str!("../../templates/order.html");
const PAGE_NAME: &str = "order.html";

pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, title: &str, view: &PageView) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("title", title);
        context.insert("view", view);
        context.insert("slots", &slots(view));
        self.tera.render(PAGE_NAME, &context)
    }
}

/// One entry per ingredient slot: the current pick, or empty.
fn slots(view: &PageView) -> Vec<&str> {
    (0..view.max_ingredients)
        .map(|i| view.selected.get(i).map_or("", String::as_str))
        .collect()
}
