pub mod compatibility_rules;
pub mod health;
pub mod index;
pub mod option_categories;
pub mod option_choices;
pub mod product_templates;
