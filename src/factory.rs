//! Ownership and life cycle of DAOs.
//!
//! A [`DaoFactory`] holds at most one DAO per entity type inside its
//! [`DaoSet`]. Factories are built by name through a [`FactoryRegistry`],
//! which creates the factory, injects its [`DataSourceConfiguration`] and only
//! then runs [`DaoFactory::init`], where connections are opened and DAOs
//! registered.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::DataSourceConfiguration;
use crate::dao::Dao;
use crate::entity::Entity;
use crate::error::{DaoError, Result};
use crate::query::TypeHasher;

// ------------- ManagedDao -------------
/// Type erased view of a registered DAO.
pub trait ManagedDao: Any {
    /// Rust type name of the entity the DAO serves.
    fn entity_type(&self) -> &'static str;
    fn entity_name(&self) -> &str;
    fn close(&mut self) -> Result<()>;
    fn is_closed(&self) -> bool;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Managed<T: Entity> {
    dao: Box<dyn Dao<T>>,
}

impl<T: Entity> ManagedDao for Managed<T> {
    fn entity_type(&self) -> &'static str {
        type_name::<T>()
    }
    fn entity_name(&self) -> &str {
        self.dao.entity_name()
    }
    fn close(&mut self) -> Result<()> {
        self.dao.close()
    }
    fn is_closed(&self) -> bool {
        self.dao.is_closed()
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ------------- DaoSet -------------
#[derive(Default)]
pub struct DaoSet {
    daos: HashMap<TypeId, Box<dyn ManagedDao>, TypeHasher>,
}

impl DaoSet {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers `dao` for `T`. A DAO already registered for `T` is closed
    /// before it is replaced, and the outcome of that close is returned. The
    /// new DAO is registered either way. `None` leaves everything untouched.
    pub fn add_dao<T: Entity>(&mut self, dao: Option<Box<dyn Dao<T>>>) -> Result<()> {
        let Some(dao) = dao else {
            return Ok(());
        };
        let key = TypeId::of::<T>();
        let outcome = match self.daos.get_mut(&key) {
            Some(previous) => {
                let closed = previous.close();
                if let Err(e) = &closed {
                    warn!(entity = type_name::<T>(), error = %e, "superseded dao did not close cleanly");
                }
                closed
            }
            None => Ok(()),
        };
        self.daos.insert(key, Box::new(Managed { dao }));
        outcome
    }
    pub fn register<T: Entity, D: Dao<T> + 'static>(&mut self, dao: D) -> Result<()> {
        let dao: Box<dyn Dao<T>> = Box::new(dao);
        self.add_dao(Some(dao))
    }
    pub fn get_dao<T: Entity>(&mut self) -> Option<&mut dyn Dao<T>> {
        let managed = self
            .daos
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Managed<T>>()?;
        let dao: &mut dyn Dao<T> = managed.dao.as_mut();
        Some(dao)
    }
    pub fn contains<T: Entity>(&self) -> bool {
        self.daos.contains_key(&TypeId::of::<T>())
    }
    /// Read only view of every registered DAO.
    pub fn daos(&self) -> impl Iterator<Item = &(dyn ManagedDao + 'static)> {
        self.daos.values().map(|managed| managed.as_ref())
    }
    pub fn len(&self) -> usize {
        self.daos.len()
    }
    pub fn is_empty(&self) -> bool {
        self.daos.is_empty()
    }
    /// Closes every DAO, even after failures, and reports the first failure.
    pub fn close(&mut self) -> Result<()> {
        let released: Vec<Result<()>> = self.daos.values_mut().map(|dao| dao.close()).collect();
        DaoError::aggregate(released)
    }
}

// ------------- DaoFactory -------------
/// State every factory carries: the injected configuration and its DAOs.
#[derive(Default)]
pub struct FactoryBase {
    configuration: Option<DataSourceConfiguration>,
    daos: DaoSet,
}

impl FactoryBase {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn configuration(&self) -> Result<&DataSourceConfiguration> {
        self.configuration.as_ref().ok_or_else(|| {
            DaoError::Configuration("factory initialised without a data source configuration".into())
        })
    }
    pub fn daos(&self) -> &DaoSet {
        &self.daos
    }
    pub fn daos_mut(&mut self) -> &mut DaoSet {
        &mut self.daos
    }
}

pub trait DaoFactory {
    fn base(&self) -> &FactoryBase;
    fn base_mut(&mut self) -> &mut FactoryBase;
    /// Opens connections and registers DAOs. Runs once, after the
    /// configuration has been injected.
    fn init(&mut self) -> Result<()>;

    fn configure(&mut self, configuration: DataSourceConfiguration) {
        self.base_mut().configuration = Some(configuration);
    }
    fn configuration(&self) -> Option<&DataSourceConfiguration> {
        self.base().configuration.as_ref()
    }
    fn daos(&self) -> &DaoSet {
        self.base().daos()
    }
    fn daos_mut(&mut self) -> &mut DaoSet {
        self.base_mut().daos_mut()
    }
    fn close(&mut self) -> Result<()> {
        let outcome = self.base_mut().daos.close();
        match &outcome {
            Ok(()) => info!(daos = self.daos().len(), "factory closed"),
            Err(e) => warn!(error = %e, "factory closed with failures"),
        }
        outcome
    }
}

impl dyn DaoFactory {
    pub fn get_dao<T: Entity>(&mut self) -> Option<&mut dyn Dao<T>> {
        self.daos_mut().get_dao::<T>()
    }
    pub fn add_dao<T: Entity>(&mut self, dao: Option<Box<dyn Dao<T>>>) -> Result<()> {
        self.daos_mut().add_dao(dao)
    }
}

// ------------- FactoryRegistry -------------
pub type FactoryConstructor = Box<dyn Fn() -> Box<dyn DaoFactory> + Send + Sync>;

/// Maps names onto factory constructors, populated at startup.
#[derive(Default)]
pub struct FactoryRegistry {
    constructors: HashMap<String, FactoryConstructor>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn DaoFactory> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }
    /// Registers `F` under its fully qualified type name.
    pub fn register_type<F: DaoFactory + Default + 'static>(&mut self) {
        self.register(type_name::<F>(), || Box::new(F::default()) as Box<dyn DaoFactory>);
    }
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Creates the factory registered as `name`, hands it `configuration` and
    /// initialises it. Unknown names and failing initialisations are both
    /// reported as [`DaoError::DaoInstantiation`].
    pub fn build_factory(
        &self,
        name: &str,
        configuration: DataSourceConfiguration,
    ) -> Result<Box<dyn DaoFactory>> {
        let constructor = self.constructors.get(name).ok_or_else(|| DaoError::DaoInstantiation {
            type_name: name.to_string(),
            reason: "no factory registered under this name".to_string(),
        })?;
        let mut factory = constructor();
        factory.configure(configuration);
        if let Err(e) = factory.init() {
            // release whatever the factory managed to set up
            if let Err(close_error) = factory.close() {
                warn!(factory = name, error = %close_error, "partially initialised factory did not close cleanly");
            }
            return Err(DaoError::DaoInstantiation {
                type_name: name.to_string(),
                reason: e.to_string(),
            });
        }
        info!(factory = name, daos = factory.daos().len(), "factory built");
        Ok(factory)
    }
}
