pub const DEPLOY_ACTOR: &str = "deploy.nais.io/github-actor";
pub const DEPLOY_COMMIT_SHA: &str = "deploy.nais.io/github-sha";
pub const DEPLOY_WORKFLOW_URL: &str = "deploy.nais.io/github-workflow-run-url";

pub const GCP_PROJECT_ID: &str = "cnrm.cloud.google.com/project-id";
pub const GCP_DELETION_POLICY: &str = "cnrm.cloud.google.com/deletion-policy";

/// Set on a deployment's pod template to trigger a rolling restart.
pub const RESTARTED_AT: &str = "kubectl.kubernetes.io/restartedAt";
