mod guide_workflow;
mod navigation;
mod token_lifecycle;
