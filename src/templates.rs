use crate::error::Result;
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

handlebars_helper!(short_date: |ts: str| ts.get(..10).unwrap_or(ts).to_string());

const TEMPLATES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.hbs")),
    ("group_list", include_str!("../templates/group_list.hbs")),
    ("profile", include_str!("../templates/profile.hbs")),
    ("post_detail", include_str!("../templates/post_detail.hbs")),
    ("create_post", include_str!("../templates/create_post.hbs")),
    ("follow", include_str!("../templates/follow.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/header.hbs")),
    ("footer", include_str!("../templates/footer.hbs")),
    ("post_card", include_str!("../templates/post_card.hbs")),
    ("paginator", include_str!("../templates/paginator.hbs")),
];

/// 页面模板（编译期内嵌）
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("short_date", Box::new(short_date));

        for (name, source) in PARTIALS {
            registry.register_partial(name, *source)?;
        }
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, *source)?;
        }

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        debug!("Rendering template {}", name);
        Ok(self.registry.render(name, context)?)
    }
}
