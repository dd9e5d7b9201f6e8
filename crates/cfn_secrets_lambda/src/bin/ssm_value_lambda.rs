use cfn_secrets_lambda::adapters::parameter_store::SsmParameterStore;
use cfn_secrets_lambda::bootstrap::serve;
use cfn_secrets_lambda::handlers::ssm_value::SsmValueHandler;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(|sdk_config| SsmValueHandler::new(SsmParameterStore::new(aws_sdk_ssm::Client::new(sdk_config))))
        .await
}
