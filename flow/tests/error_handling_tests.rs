// flow/tests/error_handling_tests.rs
mod common;

use common::*;
use flow::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_hook_for_unknown_step_fails_the_run() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("known", create_simple_handler("known", "K"));
  pipeline.on_root("typo_step", create_simple_handler("typo_step", "T"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("StepNotFound"));
      assert!(s.contains("typo_step"));
    }
    other => panic!("Expected FlowError::StepNotFound, got {:?}", other),
  }
  // Nothing ran: the check happens before the first step.
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, FlowError>::new(&[("task", false, None)]);
  pipeline.on_root("task", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().counter = 1;
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(TestContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().counter, 1);

  let mut failing = Pipeline::<TestContext, FlowError>::new(&[("fail_task", false, None)]);
  failing.on_root("fail_task", |_ctx| {
    Box::pin(async move { Err(FlowError::Internal("Intentional FlowError".to_string())) })
  });
  match failing.run(ContextData::new(TestContext::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "Intentional FlowError"),
    other => panic!("Expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_anyhow_error_converts_into_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, FlowError>::new(&[("io", false, None)]);
  pipeline.on_root("io", |_ctx| {
    Box::pin(async move { Err::<PipelineControl, _>(anyhow::anyhow!("disk unplugged")) })
  });

  match pipeline.run(ContextData::new(TestContext::default())).await {
    Err(FlowError::HandlerError { source }) => assert_eq!(source.to_string(), "disk unplugged"),
    other => panic!("Expected FlowError::HandlerError, got {:?}", other),
  }
}
