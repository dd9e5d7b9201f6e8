use cfn_secrets_lambda::adapters::parameter_store::SsmParameterStore;
use cfn_secrets_lambda::bootstrap::serve;
use cfn_secrets_lambda::handlers::secure_parameter::{SecureParameterHandler, ValueMode};
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(|sdk_config| {
        SecureParameterHandler::new(
            SsmParameterStore::new(aws_sdk_ssm::Client::new(sdk_config)),
            ValueMode::RequiredPassword,
        )
    })
    .await
}
