use futures::StreamExt;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{BedId, BedStatus, DepartmentId, DiseaseId, InventoryId, MedicineId, StaffId},
    error::ApiError,
    protocol::{
        Advisory, Bed, BedInput, BedStatusUpdate, Department, DepartmentInput, Disease,
        DiseaseInput, InventoryInput, InventoryRecord, Medicine, MedicineInput, Prediction,
        PredictionRequest, ServerEvent, StaffInput, StaffMember,
    },
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod filter;
pub mod state;
pub mod summary;

pub use error::ClientError;
pub use state::DashboardState;

type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client for the hospital dashboard API.
#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base: Url,
}

impl DashboardClient {
    pub fn new(server_url: &str) -> Result<Self> {
        let mut base =
            Url::parse(server_url.trim()).map_err(|_| ClientError::InvalidUrl(server_url.into()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(server_url.into()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ClientError::InvalidUrl(format!("{}{path}", self.base)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.http.get(self.url(path)?).send().await?;
        decode(res).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self
            .http
            .request(method, self.url(path)?)
            .json(body)
            .send()
            .await?;
        decode(res).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let res = self.http.delete(self.url(path)?).send().await?;
        ensure_success(res).await.map(drop)
    }

    pub async fn health(&self) -> Result<()> {
        let res = self.http.get(self.url("healthz")?).send().await?;
        ensure_success(res).await.map(drop)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        self.get("departments").await
    }

    pub async fn get_department(&self, department_id: DepartmentId) -> Result<Department> {
        self.get(&format!("departments/{department_id}")).await
    }

    pub async fn create_department(&self, input: &DepartmentInput) -> Result<Department> {
        self.send_json(Method::POST, "departments", input).await
    }

    pub async fn update_department(
        &self,
        department_id: DepartmentId,
        input: &DepartmentInput,
    ) -> Result<Department> {
        self.send_json(Method::PUT, &format!("departments/{department_id}"), input)
            .await
    }

    pub async fn delete_department(&self, department_id: DepartmentId) -> Result<()> {
        self.delete(&format!("departments/{department_id}")).await
    }

    pub async fn list_staff(&self) -> Result<Vec<StaffMember>> {
        self.get("staff").await
    }

    pub async fn get_staff(&self, staff_id: StaffId) -> Result<StaffMember> {
        self.get(&format!("staff/{staff_id}")).await
    }

    pub async fn create_staff(&self, input: &StaffInput) -> Result<StaffMember> {
        self.send_json(Method::POST, "staff", input).await
    }

    pub async fn update_staff(&self, staff_id: StaffId, input: &StaffInput) -> Result<StaffMember> {
        self.send_json(Method::PUT, &format!("staff/{staff_id}"), input)
            .await
    }

    pub async fn delete_staff(&self, staff_id: StaffId) -> Result<()> {
        self.delete(&format!("staff/{staff_id}")).await
    }

    pub async fn list_beds(&self, department_id: Option<DepartmentId>) -> Result<Vec<Bed>> {
        match department_id {
            Some(id) => self.get(&format!("beds?department_id={id}")).await,
            None => self.get("beds").await,
        }
    }

    pub async fn get_bed(&self, bed_id: BedId) -> Result<Bed> {
        self.get(&format!("beds/{bed_id}")).await
    }

    pub async fn create_bed(&self, input: &BedInput) -> Result<Bed> {
        self.send_json(Method::POST, "beds", input).await
    }

    pub async fn update_bed(&self, bed_id: BedId, input: &BedInput) -> Result<Bed> {
        self.send_json(Method::PUT, &format!("beds/{bed_id}"), input)
            .await
    }

    pub async fn set_bed_status(&self, bed_id: BedId, status: BedStatus) -> Result<Bed> {
        self.send_json(
            Method::PATCH,
            &format!("beds/{bed_id}/status"),
            &BedStatusUpdate { status },
        )
        .await
    }

    pub async fn delete_bed(&self, bed_id: BedId) -> Result<()> {
        self.delete(&format!("beds/{bed_id}")).await
    }

    pub async fn list_medicines(&self) -> Result<Vec<Medicine>> {
        self.get("medicines").await
    }

    pub async fn get_medicine(&self, medicine_id: MedicineId) -> Result<Medicine> {
        self.get(&format!("medicines/{medicine_id}")).await
    }

    pub async fn create_medicine(&self, input: &MedicineInput) -> Result<Medicine> {
        self.send_json(Method::POST, "medicines", input).await
    }

    pub async fn update_medicine(
        &self,
        medicine_id: MedicineId,
        input: &MedicineInput,
    ) -> Result<Medicine> {
        self.send_json(Method::PUT, &format!("medicines/{medicine_id}"), input)
            .await
    }

    pub async fn delete_medicine(&self, medicine_id: MedicineId) -> Result<()> {
        self.delete(&format!("medicines/{medicine_id}")).await
    }

    pub async fn list_inventory(&self) -> Result<Vec<InventoryRecord>> {
        self.get("inventory").await
    }

    pub async fn get_inventory(&self, inventory_id: InventoryId) -> Result<InventoryRecord> {
        self.get(&format!("inventory/{inventory_id}")).await
    }

    pub async fn create_inventory(&self, input: &InventoryInput) -> Result<InventoryRecord> {
        self.send_json(Method::POST, "inventory", input).await
    }

    pub async fn update_inventory(
        &self,
        inventory_id: InventoryId,
        input: &InventoryInput,
    ) -> Result<InventoryRecord> {
        self.send_json(Method::PUT, &format!("inventory/{inventory_id}"), input)
            .await
    }

    pub async fn delete_inventory(&self, inventory_id: InventoryId) -> Result<()> {
        self.delete(&format!("inventory/{inventory_id}")).await
    }

    pub async fn list_diseases(&self) -> Result<Vec<Disease>> {
        self.get("diseases").await
    }

    pub async fn get_disease(&self, disease_id: DiseaseId) -> Result<Disease> {
        self.get(&format!("diseases/{disease_id}")).await
    }

    pub async fn create_disease(&self, input: &DiseaseInput) -> Result<Disease> {
        self.send_json(Method::POST, "diseases", input).await
    }

    pub async fn update_disease(&self, disease_id: DiseaseId, input: &DiseaseInput) -> Result<Disease> {
        self.send_json(Method::PUT, &format!("diseases/{disease_id}"), input)
            .await
    }

    pub async fn delete_disease(&self, disease_id: DiseaseId) -> Result<()> {
        self.delete(&format!("diseases/{disease_id}")).await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Advisory>> {
        self.get("alerts").await
    }

    pub async fn predict(&self, prompt: &str) -> Result<Prediction> {
        let request = PredictionRequest {
            prompt: prompt.to_string(),
        };
        self.send_json(Method::POST, "alerts/predict", &request)
            .await
    }

    /// Opens the server's change feed. Events arrive in write order; the
    /// reader task stops when the socket closes or the feed is dropped.
    pub async fn subscribe(&self) -> Result<EventFeed> {
        let mut ws_url = self.url("ws")?;
        let scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
        ws_url
            .set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(ws_url.to_string()))?;

        let (ws_stream, _) = connect_async(ws_url.as_str()).await?;
        let (_, mut ws_reader) = ws_stream.split();
        let (tx, events) = broadcast::channel(256);

        let task = tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(error = %err, "ignoring undecodable server event"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "event feed closed with error");
                        break;
                    }
                }
            }
            debug!("event feed reader finished");
        });

        Ok(EventFeed { events, task })
    }
}

/// Live `ServerEvent` stream from [`DashboardClient::subscribe`].
pub struct EventFeed {
    events: broadcast::Receiver<ServerEvent>,
    task: JoinHandle<()>,
}

impl EventFeed {
    /// Next event, or `None` once the server closed the feed.
    pub async fn next(&mut self) -> Option<ServerEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event feed lagged; state should be refreshed");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for EventFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await?;
    match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => Err(ClientError::Api {
            status: status.as_u16(),
            error,
        }),
        Err(_) => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    Ok(ensure_success(res).await?.json().await?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
