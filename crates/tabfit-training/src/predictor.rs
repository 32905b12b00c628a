use crate::artifacts::ModelArtifact;
use crate::config::Destination;
use crate::dataset::{Column, TabularDataset};
use crate::error::PipelineResult;
use crate::store::{DataAccess, RelationalStore, WriteMode};
use tabfit_models::Regressor;
use tracing::info;

/// Appends the model's predictions to `dataset` as its last column.
///
/// The dataset must hold exactly the model's feature columns, in any order.
pub fn score<M: Regressor>(
    mut dataset: TabularDataset,
    artifact: &ModelArtifact<M>,
) -> PipelineResult<TabularDataset> {
    dataset.ensure_columns(&artifact.feature_names)?;
    let matrix = dataset.feature_matrix(&artifact.feature_names)?;
    let predictions = artifact.model.predict(&matrix)?;

    dataset.push_column(Column::numeric(artifact.prediction_column(), predictions))?;
    Ok(dataset)
}

/// Scores datasets and writes the results to a fixed destination table.
pub struct Predictor<'a, S: RelationalStore> {
    data: &'a DataAccess<S>,
    destination: Destination,
}

impl<'a, S: RelationalStore> Predictor<'a, S> {
    pub fn new(data: &'a DataAccess<S>, destination: Destination) -> Self {
        Self { data, destination }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Scores `dataset` and replaces the destination table with the result.
    pub fn predict<M: Regressor>(
        &self,
        dataset: TabularDataset,
        artifact: &ModelArtifact<M>,
    ) -> PipelineResult<TabularDataset> {
        let result = score(dataset, artifact)?;
        info!(
            rows = result.n_rows(),
            column = %artifact.prediction_column(),
            "Computed predictions"
        );

        self.data.materialize(
            &result,
            &self.destination.table,
            self.destination.namespace.as_deref(),
            WriteMode::Replace,
        )?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::store::SqliteStore;
    use rusqlite::Connection;
    use tabfit_models::{FeatureMatrix, ForestParams, RandomForestRegressor};
    use tempfile::TempDir;

    fn artifact() -> ModelArtifact<RandomForestRegressor> {
        let x = FeatureMatrix::from_columns(&[vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0]]).unwrap();
        let mut model = RandomForestRegressor::new(ForestParams { n_estimators: 5, ..Default::default() });
        model.fit(&x, &[10.0, 20.0, 30.0, 40.0]).unwrap();
        ModelArtifact::new(model, "total_sales", vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn test_score_appends_last_column() {
        // Column order differs from training order.
        let ds = TabularDataset::new(vec![Column::numeric("b", [4.0, 1.0]), Column::numeric("a", [1.0, 4.0])])
            .unwrap();
        let out = score(ds, &artifact()).unwrap();

        assert_eq!(out.column_names(), vec!["b", "a", "prediction_total_sales"]);
        assert_eq!(out.n_rows(), 2);
        let preds = out.column("prediction_total_sales").unwrap().to_f64().unwrap();
        assert!(preds[0] < preds[1]);
    }

    #[test]
    fn test_score_rejects_missing_and_extra_columns() {
        let missing = TabularDataset::new(vec![Column::numeric("a", [1.0])]).unwrap();
        assert!(matches!(score(missing, &artifact()), Err(PipelineError::Schema(_))));

        let extra = TabularDataset::new(vec![
            Column::numeric("a", [1.0]),
            Column::numeric("b", [1.0]),
            Column::numeric("total_sales", [1.0]),
        ])
        .unwrap();
        assert!(matches!(score(extra, &artifact()), Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_predict_writes_destination() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("warehouse.db");
        let data = DataAccess::with_store(SqliteStore::new(db.clone()));
        let predictor =
            Predictor::new(&data, Destination { table: "sales_predictions".to_string(), namespace: None });

        let ds = TabularDataset::new(vec![Column::numeric("a", [1.0, 2.0, 3.0]), Column::numeric("b", [3.0, 2.0, 1.0])])
            .unwrap();
        let out = predictor.predict(ds, &artifact()).unwrap();
        assert_eq!(out.n_columns(), 3);

        let conn = Connection::open(&db).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(prediction_total_sales) FROM sales_predictions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 3);
    }
}
