pub mod answer_resolver;
pub mod grade_dispatcher;
pub mod pipeline_runner;

pub use answer_resolver::AnswerResolver;
pub use grade_dispatcher::GradeDispatcher;
pub use pipeline_runner::PipelineRunner;
