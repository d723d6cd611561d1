//! `agrilink catalog` - applicator equipment, chemicals and products

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use miette::Result;

use crate::cli::output::{print_page, print_record};
use crate::cli::{GlobalOpts, SearchArgs, Session};
use crate::store::{NewChemical, NewEquipment, NewProduct};

#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// Aircraft, rigs and other equipment
    #[command(subcommand)]
    Equipment(EquipmentCommands),

    /// Registered chemicals
    #[command(subcommand)]
    Chemical(ChemicalCommands),

    /// Billable products and services
    #[command(subcommand)]
    Product(ProductCommands),

    /// US states reference list
    States(SearchArgs),
}

#[derive(Debug, Subcommand)]
pub enum EquipmentCommands {
    Add(AddEquipmentArgs),
    List(SearchArgs),
}

#[derive(Debug, Subcommand)]
pub enum ChemicalCommands {
    Add(AddChemicalArgs),
    List(SearchArgs),
}

#[derive(Debug, Subcommand)]
pub enum ProductCommands {
    Add(AddProductArgs),
    List(SearchArgs),
}

#[derive(Debug, Args)]
pub struct AddEquipmentArgs {
    #[arg(long)]
    pub name: String,

    /// drone, airplane, helicopter, ground-rig, sprayer or spreader
    #[arg(long = "type")]
    pub equipment_type: String,

    #[arg(long)]
    pub manufacturer: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub serial_number: Option<String>,

    /// Warranty end date (YYYY-MM-DD)
    #[arg(long)]
    pub warranty_expires: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct AddChemicalArgs {
    #[arg(long)]
    pub name: String,

    /// herbicide, insecticide, fungicide, fertilizer or adjuvant
    #[arg(long = "type")]
    pub chemical_type: String,

    /// EPA registration number
    #[arg(long)]
    pub registration_number: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddProductArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub code: Option<String>,

    /// Billing unit, e.g. acre or gallon
    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub price: Option<f64>,
}

impl CatalogCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let svc = &session.services;

        if let CatalogCommands::States(search) = self {
            return print_page(&svc.list_states(&search.options())?, session.format);
        }

        let actor = session.actor()?;
        match self {
            CatalogCommands::Equipment(EquipmentCommands::Add(args)) => {
                let item = svc.add_equipment(
                    &actor,
                    NewEquipment {
                        name: args.name.clone(),
                        equipment_type: args.equipment_type.clone(),
                        manufacturer: args.manufacturer.clone(),
                        model: args.model.clone(),
                        serial_number: args.serial_number.clone(),
                        warranty_expires_on: args.warranty_expires,
                    },
                )?;
                print_record(&item, Some("Equipment added"), session.format)
            }
            CatalogCommands::Equipment(EquipmentCommands::List(search)) => {
                print_page(&svc.list_equipment(&actor, &search.options())?, session.format)
            }
            CatalogCommands::Chemical(ChemicalCommands::Add(args)) => {
                let item = svc.add_chemical(
                    &actor,
                    NewChemical {
                        name: args.name.clone(),
                        chemical_type: args.chemical_type.clone(),
                        registration_number: args.registration_number.clone(),
                        manufacturer: args.manufacturer.clone(),
                    },
                )?;
                print_record(&item, Some("Chemical added"), session.format)
            }
            CatalogCommands::Chemical(ChemicalCommands::List(search)) => {
                print_page(&svc.list_chemicals(&actor, &search.options())?, session.format)
            }
            CatalogCommands::Product(ProductCommands::Add(args)) => {
                let item = svc.add_product(
                    &actor,
                    NewProduct {
                        name: args.name.clone(),
                        code: args.code.clone(),
                        unit: args.unit.clone(),
                        price: args.price,
                    },
                )?;
                print_record(&item, Some("Product added"), session.format)
            }
            CatalogCommands::Product(ProductCommands::List(search)) => {
                print_page(&svc.list_products(&actor, &search.options())?, session.format)
            }
            CatalogCommands::States(_) => Ok(()),
        }
    }
}
