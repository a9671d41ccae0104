//! Fixtures for tests
use crate::asset::{Asset, AssetType, Bandwidth, Frequency, SMALL_CELL_BANDWIDTH, Technology};
use crate::capacity::{CapacityKey, CapacityTable};
use crate::clutter::{ClutterTable, Environment};
use crate::intervention::InterventionCatalog;
use crate::lad::LADDescriptor;
use crate::model::{Model, ModelParameters};
use crate::postcode_sector::{PostcodeSectorData, SectorParameters};
use crate::scenario::{
    PopulationScenario, PopulationScenarioMap, ThroughputScenario, ThroughputScenarioMap,
};
use crate::strategy::StrategyTag;
use crate::units::{Area, Dimensionless, GigabytesPerMonth, MbpsPerKm2, Money, PerKm2};
use rstest::fixture;
use std::path::PathBuf;
use std::rc::Rc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn lad() -> LADDescriptor {
    LADDescriptor {
        id: "1".into(),
        name: "Cambridge".into(),
    }
}

#[fixture]
pub fn sector_data() -> PostcodeSectorData {
    PostcodeSectorData {
        id: "CB11".into(),
        lad_id: "1".into(),
        population: 500.0,
        area: Area(2.0),
        user_throughput: GigabytesPerMonth(2.0),
    }
}

#[fixture]
pub fn asset() -> Asset {
    Asset {
        site_id: "s1".into(),
        pcd_sector_id: "CB11".into(),
        technology: Technology::Lte,
        frequency: Frequency::Mhz800,
        bandwidth: Bandwidth::default(),
        asset_type: AssetType::MacrocellSite,
        sectors: 3,
        mast_height_m: 30,
        build_year: 2017,
    }
}

#[fixture]
pub fn sector_parameters() -> SectorParameters {
    SectorParameters {
        penetration: Dimensionless(0.8),
        market_share: Dimensionless(1.0),
        busy_hour_fraction: Dimensionless(0.15),
        mast_height_m: 30,
    }
}

#[fixture]
pub fn clutter_table() -> ClutterTable {
    ClutterTable::new([
        (PerKm2(0.0), Environment::Rural),
        (PerKm2(5.0), Environment::Urban),
    ])
    .unwrap()
}

/// Urban 800 MHz curves at 30 m and 40 m, plus a small cell curve
#[fixture]
pub fn capacity_table() -> CapacityTable {
    let curve = |max: f64| [(PerKm2(0.0), MbpsPerKm2(0.0)), (PerKm2(1.0), MbpsPerKm2(max))];
    let macro_key = |mast_height_m| CapacityKey {
        environment: Environment::Urban,
        frequency: Frequency::Mhz800,
        bandwidth: Bandwidth::default(),
        mast_height_m,
    };

    let mut table = CapacityTable::new();
    table.insert_curve(macro_key(30), curve(2.0)).unwrap();
    table.insert_curve(macro_key(40), curve(4.0)).unwrap();
    table
        .insert_curve(
            CapacityKey {
                environment: Environment::SmallCells,
                frequency: Frequency::Mhz3700,
                bandwidth: SMALL_CELL_BANDWIDTH.into(),
                mast_height_m: 30,
            },
            curve(10.0),
        )
        .unwrap();

    table
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        base_year: 2020,
        end_year: 2021,
        annual_budget: Money(1e6),
        service_obligation_capacity: MbpsPerKm2(2.0),
        penetration: Dimensionless(0.8),
        busy_hour_fraction: Dimensionless(0.15),
        market_share: Dimensionless(1.0),
        mast_height_m: 30,
        raised_mast_height_m: 40,
        spectrum_release_year: 2020,
        population_scenarios: vec!["baseline".into()],
        throughput_scenarios: vec!["baseline".into()],
        strategies: vec![StrategyTag::Minimal, StrategyTag::SmallCellAndSpectrum],
    }
}

/// Population grows by 100 a year; throughput is flat
#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    lad: LADDescriptor,
    sector_data: PostcodeSectorData,
    asset: Asset,
    capacity_table: CapacityTable,
    clutter_table: ClutterTable,
) -> Model {
    let population = PopulationScenario(
        [
            ((2020, sector_data.id.clone()), 500.0),
            ((2021, sector_data.id.clone()), 600.0),
        ]
        .into_iter()
        .collect(),
    );
    let throughput = ThroughputScenario(
        [
            (2020, GigabytesPerMonth(2.0)),
            (2021, GigabytesPerMonth(2.0)),
        ]
        .into_iter()
        .collect(),
    );

    Model {
        model_path: PathBuf::from("model"),
        parameters: model_parameters,
        lads: vec![lad],
        postcode_sectors: vec![sector_data],
        assets: vec![asset],
        population_scenarios: PopulationScenarioMap::from([("baseline".into(), population)]),
        throughput_scenarios: ThroughputScenarioMap::from([("baseline".into(), throughput)]),
        capacity_table: Rc::new(capacity_table),
        clutter_table,
        catalog: InterventionCatalog::default(),
    }
}
