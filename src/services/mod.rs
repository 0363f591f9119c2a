pub mod credential_service;
pub mod prompt_templates;
pub mod score_parser;
pub mod scoring_service;
pub mod task_service;
pub mod weekly_report_service;
