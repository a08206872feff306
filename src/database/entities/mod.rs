pub mod compatibility_rules;
pub mod option_categories;
pub mod option_choices;
pub mod product_templates;
