use cfn_secrets_lambda::adapters::key_service::KmsKeyService;
use cfn_secrets_lambda::bootstrap::serve;
use cfn_secrets_lambda::handlers::encrypt::EncryptHandler;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(|sdk_config| EncryptHandler::new(KmsKeyService::new(aws_sdk_kms::Client::new(sdk_config))))
        .await
}
