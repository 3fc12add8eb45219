/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module implements the generic append-only store that backs the feature-structure
//! graph and the type schema: items are held in a [`Store`] and addressed through cheap
//! numeric handles, with an [`IdMap`] resolving public identifiers to handles.

use nanoid::nanoid;
use sealed::sealed;

use crate::config::Configurable;
use crate::error::AnnoError;
use crate::types::*;

/// This trait is implemented on items that can be stored in a [`Store`], it associates
/// the item with its handle type and gives access to its identifiers.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait Storable: PartialEq {
    type HandleType: Handle;

    /// Retrieve the internal (numeric) id. For any type used in [`StoreFor<T>`], this may be
    /// None only in the initial stage when it is still unbound to a store.
    fn handle(&self) -> Option<Self::HandleType> {
        None
    }

    /// Like [`Self::handle()`] but returns an [`AnnoError::Unbound`] error if there is no internal id.
    fn handle_or_err(&self) -> Result<Self::HandleType, AnnoError> {
        self.handle().ok_or(AnnoError::Unbound("handle_or_err"))
    }

    /// Get the public ID
    fn id(&self) -> Option<&str> {
        None
    }

    /// Like [`Self::id()`] but returns an [`AnnoError::NoIdError`] error if there is no public id.
    fn id_or_err(&self) -> Result<&str, AnnoError> {
        self.id().ok_or(AnnoError::NoIdError("id_or_err"))
    }

    /// Builder pattern to set the public Id
    #[allow(unused_variables)]
    fn with_id(self, id: String) -> Self
    where
        Self: Sized,
    {
        //no-op in default implementation
        self
    }

    /// Does this type carry a public id?
    fn carries_id() -> bool {
        true
    }

    /// Set the internal ID. May only be called once (though currently not enforced).
    #[allow(unused_variables)]
    fn set_handle(&mut self, handle: <Self as Storable>::HandleType) {
        //no-op in default implementation
    }

    /// Generate a random public ID and register it in the given idmap. The item must be bound already.
    fn generate_id(self, idmap: Option<&mut IdMap<Self::HandleType>>) -> Self
    where
        Self: Sized,
    {
        if let Some(intid) = self.handle() {
            if let Some(idmap) = idmap {
                loop {
                    let id = format!("{}{}", idmap.autoprefix, nanoid!());
                    let id_copy = id.clone();
                    if idmap.data.insert(id, intid).is_none() {
                        //checks for collisions (extremely unlikely)
                        //returns none if the key did not exist yet
                        return self.with_id(id_copy);
                    }
                }
            }
        }
        // if the item is not bound or has no idmap, we can't check collisions, but that's okay
        self.with_id(format!("X{}", nanoid!()))
    }
}

/// This trait is implemented on types that provide storage for a certain other generic type (T)
/// It is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait StoreFor<T: Storable>: Configurable {
    /// Get a reference to the entire store for the associated type
    fn store(&self) -> &Store<T>;
    /// Get a mutable reference to the entire store for the associated type
    fn store_mut(&mut self) -> &mut Store<T>;
    /// Get a reference to the id map for the associated type, mapping public ids to internal ids
    fn idmap(&self) -> Option<&IdMap<T::HandleType>> {
        None
    }
    /// Get a mutable reference to the id map for the associated type, mapping public ids to internal ids
    fn idmap_mut(&mut self) -> Option<&mut IdMap<T::HandleType>> {
        None
    }

    fn store_typeinfo() -> &'static str;

    /// Adds an item to the store. Returns a handle to it upon success.
    fn insert(&mut self, mut item: T) -> Result<T::HandleType, AnnoError> {
        debug(self.config(), || {
            format!("StoreFor<{}>.insert: new item", Self::store_typeinfo())
        });
        let handle = if let Some(intid) = item.handle() {
            intid
        } else {
            // item has no internal id yet, i.e. it is unbound
            // we generate an id and bind it now
            let intid = self.next_handle();
            item = self.bind(item)?;
            intid
        };

        if T::carries_id() {
            //insert a mapping from the public ID to the internal numeric ID in the idmap
            if let Some(id) = item.id() {
                //check if the public ID does not already exist
                if self.has_id(id) {
                    //the ID exists already; if the existing item is exactly the same as the
                    //item we are about to insert, we discard the error and return the
                    //existing handle without inserting a new item
                    let existing_item = self.get_by_id(id)?;
                    if *existing_item == item {
                        return Ok(existing_item.handle_or_err()?);
                    }
                    //in all other cases, we return an error
                    return Err(AnnoError::DuplicateIdError(
                        id.to_string(),
                        Self::store_typeinfo(),
                    ));
                }

                self.idmap_mut().map(|idmap| {
                    idmap.data.insert(id.to_string(), handle);
                });
            } else if self.config().generate_ids() {
                item = item.generate_id(self.idmap_mut());
                debug(self.config(), || {
                    format!(
                        "StoreFor<{}>.insert: ^--- autogenerated id {}",
                        Self::store_typeinfo(),
                        item.id().unwrap(),
                    )
                });
            }
        }

        self.preinsert(&mut item)?;

        //add the item
        self.store_mut().push(Some(item));

        self.inserted(handle)?;

        assert_eq!(
            handle,
            T::HandleType::new(self.store().len() - 1),
            "sanity check to ensure no item can determine its own internal id that does not correspond with what's allocated"
        );

        Ok(handle)
    }

    /// Called prior to inserting an item into to the store.
    /// If it returns an error, the insert will be cancelled.
    #[allow(unused_variables)]
    fn preinsert(&self, item: &mut T) -> Result<(), AnnoError> {
        //default implementation does nothing
        Ok(())
    }

    /// Called after an item was inserted to the store.
    /// Allows the store to do further bookkeeping like updating relation maps.
    #[allow(unused_variables)]
    fn inserted(&mut self, handle: T::HandleType) -> Result<(), AnnoError> {
        //default implementation does nothing
        Ok(())
    }

    /// Builder pattern variant of [`Self::insert()`]
    fn add(mut self, item: T) -> Result<Self, AnnoError>
    where
        Self: Sized,
    {
        self.insert(item)?;
        Ok(self)
    }

    /// Returns true if the store has the item with the specified internal id
    fn has(&self, handle: T::HandleType) -> bool {
        matches!(self.store().get(handle.as_usize()), Some(Some(_)))
    }

    /// Returns true if the store has the item with the specified public id
    fn has_id(&self, id: &str) -> bool {
        if let Some(idmap) = self.idmap() {
            idmap.data.contains_key(id)
        } else {
            false
        }
    }

    /// Resolves a public id to a handle
    fn resolve_id(&self, id: &str) -> Result<T::HandleType, AnnoError> {
        if let Some(idmap) = self.idmap() {
            idmap
                .data
                .get(id)
                .copied()
                .ok_or_else(|| AnnoError::IdError(id.to_string(), Self::store_typeinfo()))
        } else {
            Err(AnnoError::NoIdError(Self::store_typeinfo()))
        }
    }

    /// Get a reference to an item from the store by its public ID
    fn get_by_id<'a>(&'a self, id: &str) -> Result<&'a T, AnnoError> {
        let handle = self.resolve_id(id)?;
        self.get(handle)
    }

    /// Get a reference to an item from the store by internal ID
    fn get(&self, handle: T::HandleType) -> Result<&T, AnnoError> {
        if let Some(Some(item)) = self.store().get(handle.as_usize()) {
            Ok(item)
        } else {
            Err(AnnoError::HandleError(Self::store_typeinfo()))
        }
    }

    /// Get a mutable reference to an item from the store by internal ID
    fn get_mut(&mut self, handle: T::HandleType) -> Result<&mut T, AnnoError> {
        if let Some(Some(item)) = self.store_mut().get_mut(handle.as_usize()) {
            Ok(item)
        } else {
            Err(AnnoError::HandleError("StoreFor::get_mut"))
        }
    }

    /// Iterate over all items in the store, along with their handles
    fn iter_items(&self) -> StoreIter<T> {
        StoreIter {
            iter: self.store().iter().enumerate(),
        }
    }

    /// Binds an unbound item to this store, assigning its internal id. This does NOT add the
    /// item to the store yet, insert() takes care of that.
    fn bind(&mut self, mut item: T) -> Result<T, AnnoError> {
        if item.handle().is_some() {
            Err(AnnoError::OtherError(
                "bind() can only be called once on an unbound item",
            ))
        } else {
            item.set_handle(self.next_handle());
            Ok(item)
        }
    }

    /// Returns the handle the next inserted item will get
    fn next_handle(&self) -> T::HandleType {
        //this is one of the very few places in the code where we create a handle from scratch
        T::HandleType::new(self.store().len())
    }
}

/// Iterator over all items in a store, yields (handle, item) pairs and skips deleted slots
pub struct StoreIter<'a, T>
where
    T: Storable,
{
    iter: std::iter::Enumerate<std::slice::Iter<'a, Option<T>>>,
}

impl<'a, T> Iterator for StoreIter<'a, T>
where
    T: Storable,
{
    type Item = (T::HandleType, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.iter.next() {
                Some((index, Some(item))) => {
                    return Some((T::HandleType::new(index), item));
                }
                Some((_, None)) => continue,
                None => return None,
            }
        }
    }
}
