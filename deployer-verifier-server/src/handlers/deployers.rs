use crate::api_error::ApiError;
use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use deployer_verifier::{
    ChainId, Contract, DeployerVerificationService, DeployerView, ManualContractRequest,
    VerificationChallenge, VerifiedDeployer,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::instrument;

type Service = web::Data<DeployerVerificationService>;

#[derive(Debug, Deserialize)]
pub struct DeployerPath {
    pub project_id: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ContractPath {
    pub project_id: String,
    pub address: String,
    pub chain_id: String,
    pub contract: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVerificationRequest {
    pub signature: String,
    pub chain_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContractRequest {
    pub contract_address: String,
    pub tx_hash: String,
    pub chain_id: u64,
    pub signature: String,
}

/// Malformed hex is passed on as an empty signature, which never verifies.
fn decode_signature(signature: &str) -> Vec<u8> {
    let signature = signature.strip_prefix("0x").unwrap_or(signature);
    hex::decode(signature).unwrap_or_default()
}

#[instrument(skip(service), level = "debug")]
pub async fn begin_verification(
    service: Service,
    path: web::Path<DeployerPath>,
) -> Result<Json<VerificationChallenge>, ApiError> {
    let challenge = service
        .begin_verification(&path.project_id, &path.address)
        .await?;
    Ok(Json(challenge))
}

#[instrument(skip(service, request), level = "debug")]
pub async fn confirm_verification(
    service: Service,
    path: web::Path<DeployerPath>,
    request: Json<ConfirmVerificationRequest>,
) -> Result<Json<VerifiedDeployer>, ApiError> {
    let signature = decode_signature(&request.signature);
    let verified = service
        .confirm_verification(
            &path.project_id,
            &path.address,
            &signature,
            request.chain_id,
        )
        .await?;
    Ok(Json(verified))
}

#[instrument(skip(service), level = "debug")]
pub async fn reconcile(
    service: Service,
    path: web::Path<DeployerPath>,
) -> Result<Json<VerifiedDeployer>, ApiError> {
    let reconciled = service.reconcile(&path.project_id, &path.address).await?;
    Ok(Json(reconciled))
}

#[instrument(skip(service, request), level = "debug")]
pub async fn add_manual_contract(
    service: Service,
    path: web::Path<DeployerPath>,
    request: Json<AddContractRequest>,
) -> Result<HttpResponse, ApiError> {
    let DeployerPath {
        project_id,
        address,
    } = path.into_inner();
    let request = request.into_inner();
    let contract: Contract = service
        .add_manual_contract(ManualContractRequest {
            project_id,
            deployer_address: address,
            contract_address: request.contract_address,
            tx_hash: request.tx_hash,
            chain_id: request.chain_id,
            signature: decode_signature(&request.signature),
        })
        .await?;
    Ok(HttpResponse::Created().json(contract))
}

#[instrument(skip(service), level = "debug")]
pub async fn toggle_exclusion(
    service: Service,
    path: web::Path<ContractPath>,
) -> Result<Json<Contract>, ApiError> {
    let chain_id = ChainId::from_str(&path.chain_id)?;
    let contract = service
        .toggle_exclusion(&path.project_id, &path.address, &path.contract, chain_id)
        .await?;
    Ok(Json(contract))
}

#[instrument(skip(service), level = "debug")]
pub async fn get_deployer(
    service: Service,
    path: web::Path<DeployerPath>,
) -> Result<Json<DeployerView>, ApiError> {
    let view = service
        .get_deployer(&path.project_id, &path.address)
        .await?;
    Ok(Json(view))
}

#[instrument(skip(service), level = "debug")]
pub async fn remove_deployer(
    service: Service,
    path: web::Path<DeployerPath>,
) -> Result<HttpResponse, ApiError> {
    service
        .remove_deployer(&path.project_id, &path.address)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
