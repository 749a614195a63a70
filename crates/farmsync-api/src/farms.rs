// Farm endpoints

use tracing::debug;

use crate::client::PestScoutClient;
use crate::error::Error;
use crate::models::FarmDto;

impl PestScoutClient {
    /// List every farm visible to the authenticated user.
    ///
    /// `GET /api/farms` -- the full set, unpaginated.
    pub async fn list_farms(&self) -> Result<Vec<FarmDto>, Error> {
        let url = self.url("api/farms")?;
        let farms: Vec<FarmDto> = self.get(url).await?;
        debug!(count = farms.len(), "listed farms");
        Ok(farms)
    }
}
