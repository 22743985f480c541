//! Embedded static source table. A representative slice of real
//! authorities and the national TIGER aggregator, not an exhaustive
//! fifty-state catalog — adding a state is adding a row here.

use shadow_atlas_contracts::{
    AuthorityLevel, BoundaryType, Jurisdiction, SourceDescriptor, SourceKind, SourceUrl, UpdateTrigger,
};

pub(crate) fn seed_sources() -> Vec<SourceDescriptor> {
    let mut sources = Vec::new();

    // TIGER/Line: national aggregator, covers every boundary type.
    for bt in BoundaryType::ALL {
        sources.push(SourceDescriptor {
            id: format!("tiger-{bt}"),
            kind: SourceKind::Aggregator,
            authority_level: AuthorityLevel::new(3),
            preference_rank: 99,
            boundary_type: bt,
            jurisdiction: Jurisdiction::wildcard(),
            entity: "U.S. Census Bureau".into(),
            legal_basis: "Title 13 U.S. Code".into(),
            url: SourceUrl::Template("https://www2.census.gov/geo/tiger/TIGER{YEAR}/".into()),
            publish_schedule_hints: vec!["annual-july".into()],
            machine_readable: true,
            format: "shapefile".into(),
        });
    }

    // A handful of real state-level primary authorities.
    sources.push(SourceDescriptor {
        id: "ca-citizens-redistricting-commission".into(),
        kind: SourceKind::Primary,
        authority_level: AuthorityLevel::new(5),
        preference_rank: 1,
        boundary_type: BoundaryType::Congressional,
        jurisdiction: Jurisdiction::new("CA"),
        entity: "California Citizens Redistricting Commission".into(),
        legal_basis: "Cal. Const. art. XXI".into(),
        url: SourceUrl::Direct("https://wedrawthelines.ca.gov/maps/".into()),
        publish_schedule_hints: vec!["redistricting".into()],
        machine_readable: true,
        format: "geojson".into(),
    });
    sources.push(SourceDescriptor {
        id: "ca-citizens-redistricting-commission-senate".into(),
        kind: SourceKind::Primary,
        authority_level: AuthorityLevel::new(5),
        preference_rank: 1,
        boundary_type: BoundaryType::StateSenate,
        jurisdiction: Jurisdiction::new("CA"),
        entity: "California Citizens Redistricting Commission".into(),
        legal_basis: "Cal. Const. art. XXI".into(),
        url: SourceUrl::Direct("https://wedrawthelines.ca.gov/maps/".into()),
        publish_schedule_hints: vec!["redistricting".into()],
        machine_readable: true,
        format: "geojson".into(),
    });
    sources.push(SourceDescriptor {
        id: "tx-legislative-council".into(),
        kind: SourceKind::Primary,
        authority_level: AuthorityLevel::new(5),
        preference_rank: 1,
        boundary_type: BoundaryType::Congressional,
        jurisdiction: Jurisdiction::new("TX"),
        entity: "Texas Legislative Council".into(),
        legal_basis: "Tex. Gov't Code Ann. ch. 302".into(),
        url: SourceUrl::Direct("https://data.capitol.texas.gov/dataset/districts".into()),
        publish_schedule_hints: vec!["redistricting".into()],
        machine_readable: true,
        format: "shapefile".into(),
    });
    sources.push(SourceDescriptor {
        id: "ny-gis-clearinghouse-county".into(),
        kind: SourceKind::Primary,
        authority_level: AuthorityLevel::new(4),
        preference_rank: 1,
        boundary_type: BoundaryType::County,
        jurisdiction: Jurisdiction::new("NY"),
        entity: "New York State GIS Clearinghouse".into(),
        legal_basis: "N.Y. Exec. Law § 102".into(),
        url: SourceUrl::Direct("https://gis.ny.gov/gisdata/inventories/counties.cfm".into()),
        publish_schedule_hints: vec!["annual".into()],
        machine_readable: true,
        format: "shapefile".into(),
    });
    sources.push(SourceDescriptor {
        id: "wa-redistricting-commission".into(),
        kind: SourceKind::Primary,
        authority_level: AuthorityLevel::new(5),
        preference_rank: 1,
        boundary_type: BoundaryType::StateHouse,
        jurisdiction: Jurisdiction::new("WA"),
        entity: "Washington State Redistricting Commission".into(),
        legal_basis: "Wash. Const. art. II, § 43".into(),
        url: SourceUrl::Direct("https://www.redistricting.wa.gov/maps".into()),
        publish_schedule_hints: vec!["redistricting".into()],
        machine_readable: true,
        format: "geojson".into(),
    });

    sources
}

pub(crate) fn trigger_for(source: &SourceDescriptor) -> UpdateTrigger {
    if source.kind == SourceKind::Aggregator {
        return UpdateTrigger::Annual { month: 7 };
    }
    match source.boundary_type {
        BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse => {
            UpdateTrigger::Redistricting { years: vec![2021, 2022, 2031, 2032] }
        }
        _ => UpdateTrigger::Annual { month: 1 },
    }
}

pub(crate) fn expected_lag_days(boundary_type: BoundaryType) -> u32 {
    match boundary_type {
        BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse => 365,
        BoundaryType::County | BoundaryType::Place | BoundaryType::Cdp => 90,
        _ => 30,
    }
}

pub(crate) fn authority_entity(boundary_type: BoundaryType) -> String {
    match boundary_type {
        BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse => {
            "State redistricting commission / legislature".into()
        }
        BoundaryType::County => "County government / state GIS clearinghouse".into(),
        BoundaryType::Place | BoundaryType::Cdp => "Municipal government / Census Bureau".into(),
        BoundaryType::SchoolElementary | BoundaryType::SchoolSecondary | BoundaryType::SchoolUnified => {
            "Local school district".into()
        }
        _ => "Municipal or special-district authority".into(),
    }
}

pub(crate) fn legal_basis(boundary_type: BoundaryType) -> String {
    match boundary_type {
        BoundaryType::Congressional => "U.S. Const. art. I, § 2".into(),
        BoundaryType::StateSenate | BoundaryType::StateHouse => "State constitution / statute".into(),
        _ => "State or local enabling statute".into(),
    }
}
